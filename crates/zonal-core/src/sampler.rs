//! Polygon-to-grid sampling.
//!
//! Polygon vertices are mapped into continuous pixel space with the inverse
//! affine transform, where cell `(r, c)` is the unit square `[c, c+1) × [r, r+1)`.
//! Point-in-polygon is invariant under affine maps, so a rotated raster needs
//! no special handling. Work is confined to the polygon's pixel-space bounding
//! box clipped to the grid.
//!
//! Cell-centre selection is an even–odd scanline fill evaluated on each row's
//! centre line with a half-open crossing rule: a centre lying exactly on a
//! polygon edge belongs to the polygon on its right/lower side only, so
//! adjacent units never both claim it.
use serde::{Deserialize, Serialize};

use crate::geometry::{Coord, Polygon, PolygonPart};
use crate::raster::RasterGrid;

/// Which cells a polygon selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicy {
    /// Cells whose centre lies inside the polygon.
    #[default]
    CellCenter,
    /// Cell-centre cells plus every cell whose interior the boundary crosses.
    AllTouched,
}

#[derive(Debug, Clone, Copy)]
struct Px {
    x: f64,
    y: f64,
}

/// Inclusive cell window `[r0, r1] × [c0, c1]` inside the grid.
#[derive(Debug, Clone, Copy)]
struct Window {
    r0: usize,
    r1: usize,
    c0: usize,
    c1: usize,
}

impl Window {
    fn cols(&self) -> usize {
        self.c1 - self.c0 + 1
    }

    fn len(&self) -> usize {
        (self.r1 - self.r0 + 1) * self.cols()
    }

    #[inline]
    fn index(&self, r: usize, c: usize) -> usize {
        (r - self.r0) * self.cols() + (c - self.c0)
    }

    /// Clamp an integer-valued float range to `[lo, hi]`.
    fn clamp_span(a: f64, b: f64, lo: usize, hi: usize) -> Option<(usize, usize)> {
        let a = a.max(lo as f64);
        let b = b.min(hi as f64);
        (a <= b).then(|| (a as usize, b as usize))
    }

    fn col_span(&self, a: f64, b: f64) -> Option<(usize, usize)> {
        Self::clamp_span(a, b, self.c0, self.c1)
    }

    fn row_span(&self, a: f64, b: f64) -> Option<(usize, usize)> {
        Self::clamp_span(a, b, self.r0, self.r1)
    }
}

/// A part with every ring mapped into pixel space.
struct PixelPart {
    rings: Vec<Vec<Px>>,
}

impl PixelPart {
    fn new(grid: &RasterGrid, part: &PolygonPart) -> Self {
        let rings = part
            .rings()
            .map(|ring| {
                ring.vertices()
                    .iter()
                    .map(|&c| {
                        let (x, y) = grid.to_pixel(c);
                        Px { x, y }
                    })
                    .collect()
            })
            .collect();
        Self { rings }
    }

    fn edges(&self) -> impl Iterator<Item = (Px, Px)> + '_ {
        self.rings.iter().flat_map(|r| r.windows(2).map(|w| (w[0], w[1])))
    }

    /// Mark cells whose centre is inside the part (holes excluded).
    fn fill_centres(&self, win: &Window, mask: &mut [bool]) {
        let mut xs: Vec<f64> = Vec::new();
        for r in win.r0..=win.r1 {
            let yc = r as f64 + 0.5;
            xs.clear();
            for (a, b) in self.edges() {
                if (a.y > yc) != (b.y > yc) {
                    xs.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            xs.sort_by(f64::total_cmp);
            for pair in xs.chunks_exact(2) {
                // Centres c + 0.5 in [x_in, x_out).
                let first = (pair[0] - 0.5).ceil();
                let last = (pair[1] - 0.5).ceil() - 1.0;
                if let Some((c_lo, c_hi)) = win.col_span(first, last) {
                    for c in c_lo..=c_hi {
                        mask[win.index(r, c)] = true;
                    }
                }
            }
        }
    }

    /// Mark every cell whose open interior a boundary segment passes through.
    /// A segment running along a grid line, or crossing only a grid corner,
    /// marks none of the cells it borders, whichever side they lie on.
    fn trace_boundary(&self, win: &Window, mask: &mut [bool]) {
        for (a, b) in self.edges() {
            let (y_min, y_max) = (a.y.min(b.y), a.y.max(b.y));
            let Some((r_lo, r_hi)) = win.row_span(y_min.floor(), y_max.ceil() - 1.0) else {
                continue;
            };
            for r in r_lo..=r_hi {
                let (x_lo, x_hi) = if a.y == b.y {
                    (a.x.min(b.x), a.x.max(b.x))
                } else {
                    let at = |y: f64| a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
                    let xa = at(y_min.max(r as f64));
                    let xb = at(y_max.min(r as f64 + 1.0));
                    (xa.min(xb), xa.max(xb))
                };
                // Columns c with c < x_hi and c + 1 > x_lo.
                if let Some((c_lo, c_hi)) = win.col_span(x_lo.floor(), x_hi.ceil() - 1.0) {
                    for c in c_lo..=c_hi {
                        mask[win.index(r, c)] = true;
                    }
                }
            }
        }
    }
}

/// Valid cell values selected by `polygon`, in row-major order.
///
/// Cells equal to the grid's no-data sentinel are skipped, as are cells
/// outside the grid. Multi-part units are the union of their parts: a cell
/// selected by two parts is returned once. A polygon that covers no valid
/// cell yields an empty vector.
pub fn sample(grid: &RasterGrid, polygon: &Polygon, policy: CoveragePolicy) -> Vec<f64> {
    let Some((x0, y0, x1, y1)) = polygon.bounds() else {
        return Vec::new();
    };
    if grid.width() == 0 || grid.height() == 0 {
        return Vec::new();
    }

    // The pixel-space box of the world box's corners contains every vertex,
    // rotated grids included.
    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)].map(|(x, y)| grid.to_pixel(Coord::new(x, y)));
    let (min_x, min_y, max_x, max_y) = corners.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(a, b, c, d), &(px, py)| (a.min(px), b.min(py), c.max(px), d.max(py)),
    );
    let full = Window { r0: 0, r1: grid.height() - 1, c0: 0, c1: grid.width() - 1 };
    let (Some((c0, c1)), Some((r0, r1))) = (
        full.col_span(min_x.floor(), max_x.floor()),
        full.row_span(min_y.floor(), max_y.floor()),
    ) else {
        return Vec::new();
    };
    let win = Window { r0, r1, c0, c1 };

    let parts: Vec<PixelPart> = polygon.parts.iter().map(|p| PixelPart::new(grid, p)).collect();
    let mut mask = vec![false; win.len()];
    for part in &parts {
        part.fill_centres(&win, &mut mask);
        if policy == CoveragePolicy::AllTouched {
            part.trace_boundary(&win, &mut mask);
        }
    }

    let mut values = Vec::new();
    for r in win.r0..=win.r1 {
        for c in win.c0..=win.c1 {
            if mask[win.index(r, c)] {
                if let Some(v) = grid.valid(r, c) {
                    values.push(v);
                }
            }
        }
    }
    values
}
