use serde::{Deserialize, Serialize};

use crate::crs::Crs;
use crate::error::{Result, ZonalError};
use crate::geometry::Coord;

/// Six-term affine georeferencing transform in GDAL order:
///
///   x = origin_x + col · pixel_width + row · row_rotation
///   y = origin_y + col · col_rotation + row · pixel_height
///
/// `(col, row)` are continuous pixel coordinates; cell `(r, c)` covers
/// `[c, c+1) × [r, r+1)` and its centre is `(c + 0.5, r + 0.5)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation. `pixel_height` is usually negative.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// World coordinate → continuous pixel `(col, row)`.
    /// Returns `None` for a singular transform.
    pub fn invert(&self, c: Coord) -> Option<(f64, f64)> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(self.invert_with(det, c))
    }

    #[inline]
    fn invert_with(&self, det: f64, c: Coord) -> (f64, f64) {
        let dx = c.x - self.origin_x;
        let dy = c.y - self.origin_y;
        let col = (dx * self.pixel_height - dy * self.row_rotation) / det;
        let row = (dy * self.pixel_width - dx * self.col_rotation) / det;
        (col, row)
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(t: [f64; 6]) -> Self {
        Self {
            origin_x: t[0],
            pixel_width: t[1],
            row_rotation: t[2],
            origin_y: t[3],
            col_rotation: t[4],
            pixel_height: t[5],
        }
    }
}

impl From<GeoTransform> for [f64; 6] {
    fn from(t: GeoTransform) -> Self {
        [t.origin_x, t.pixel_width, t.row_rotation, t.origin_y, t.col_rotation, t.pixel_height]
    }
}

/// A georeferenced 2D grid of cell values, row-major, row 0 at the transform
/// origin. Read-only once constructed; shared by reference across workers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterGrid {
    data: Vec<f64>,
    width: usize,
    height: usize,
    transform: GeoTransform,
    crs: Option<Crs>,
    nodata: Option<f64>,
}

impl RasterGrid {
    /// Validate and wrap a grid. Fails when the buffer does not match the
    /// declared shape or when the transform cannot be inverted.
    pub fn new(
        data: Vec<f64>,
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: Option<Crs>,
        nodata: Option<f64>,
    ) -> Result<Self> {
        if width.checked_mul(height) != Some(data.len()) {
            return Err(ZonalError::InvalidRaster {
                reason: format!("{} cells supplied for a {width}×{height} grid", data.len()),
            });
        }
        if transform.invert(Coord::new(transform.origin_x, transform.origin_y)).is_none() {
            return Err(ZonalError::InvalidRaster {
                reason: "affine transform is not invertible".to_string(),
            });
        }
        Ok(Self { data, width, height, transform, crs, nodata })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    /// True when `v` equals the no-data sentinel. A NaN sentinel matches NaN.
    #[inline]
    pub fn is_nodata(&self, v: f64) -> bool {
        match self.nodata {
            Some(nd) if nd.is_nan() => v.is_nan(),
            Some(nd) => v == nd,
            None => false,
        }
    }

    /// Cell value, or `None` if the cell holds the no-data sentinel.
    #[inline]
    pub fn valid(&self, row: usize, col: usize) -> Option<f64> {
        let v = self.get(row, col);
        (!self.is_nodata(v)).then_some(v)
    }

    /// World coordinate → continuous pixel `(col, row)`. Infallible because the
    /// transform was checked for invertibility at construction.
    #[inline]
    pub fn to_pixel(&self, c: Coord) -> (f64, f64) {
        self.transform.invert_with(self.transform.determinant(), c)
    }

    /// Count of cells not equal to the sentinel.
    pub fn valid_cell_count(&self) -> usize {
        self.data.iter().filter(|&&v| !self.is_nodata(v)).count()
    }
}
