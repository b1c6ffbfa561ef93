//! Coordinate transforms between resolved reference systems.
//!
//! Web Mercator ↔ WGS84 is inline spherical math. Every other pair goes
//! through `proj4rs`, datum shifts included. A pair involving Web Mercator
//! and a third system chains both: Mercator → WGS84 → target.
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use proj4rs::proj::Proj;

use super::definitions::{is_geographic, proj_string};
use super::Crs;
use crate::error::{Result, ZonalError};
use crate::geometry::Coord;

/// Web Mercator sphere radius (m).
const MERCATOR_RADIUS: f64 = 6_378_137.0;
/// Web Mercator latitude limit (degrees); beyond it y diverges.
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_6;

fn merc_to_lonlat(c: Coord) -> Coord {
    let lon = (c.x / MERCATOR_RADIUS).to_degrees();
    let lat = (2.0 * (c.y / MERCATOR_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
    Coord::new(lon, lat)
}

fn lonlat_to_merc(c: Coord) -> Coord {
    let lat = c.y.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    Coord::new(MERCATOR_RADIUS * c.x.to_radians(), MERCATOR_RADIUS * (FRAC_PI_4 + lat / 2.0).tan().ln())
}

/// A `proj4rs` source/target pair with the degree↔radian handling each side needs.
struct ProjPair {
    source: Proj,
    target: Proj,
    source_is_geographic: bool,
    target_is_geographic: bool,
}

impl ProjPair {
    fn new(from: Crs, to: Crs) -> Result<Self> {
        let unsupported = || ZonalError::CrsUnsupported { from, to };
        let load = |crs: Crs| -> Result<Proj> {
            let def = proj_string(crs.code()).ok_or_else(unsupported)?;
            Proj::from_proj_string(&def).map_err(|_| unsupported())
        };
        Ok(Self {
            source: load(from)?,
            target: load(to)?,
            source_is_geographic: is_geographic(from.code()),
            target_is_geographic: is_geographic(to.code()),
        })
    }

    fn transform(&self, c: Coord) -> std::result::Result<Coord, String> {
        let mut point = if self.source_is_geographic {
            (c.x.to_radians(), c.y.to_radians(), 0.0)
        } else {
            (c.x, c.y, 0.0)
        };
        proj4rs::transform::transform(&self.source, &self.target, &mut point).map_err(|e| format!("{e:?}"))?;
        Ok(if self.target_is_geographic {
            Coord::new(point.0.to_degrees(), point.1.to_degrees())
        } else {
            Coord::new(point.0, point.1)
        })
    }
}

enum Step {
    MercToLonLat,
    LonLatToMerc,
    Proj(Box<ProjPair>),
}

/// A resolved forward transform from one system to another.
pub struct Transformer {
    from: Crs,
    to: Crs,
    steps: Vec<Step>,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

impl Transformer {
    /// Resolve `from → to`. Fails with `CrsUnsupported` when either code has
    /// no definition.
    pub fn new(from: Crs, to: Crs) -> Result<Self> {
        let mut steps = Vec::with_capacity(3);
        if from == to {
            return Ok(Self { from, to, steps });
        }

        let (a, b) = (mercator_to_wgs84(from), mercator_to_wgs84(to));
        if from == Crs::WEB_MERCATOR {
            steps.push(Step::MercToLonLat);
        }
        if a != b {
            let pair = ProjPair::new(a, b).map_err(|_| ZonalError::CrsUnsupported { from, to })?;
            steps.push(Step::Proj(Box::new(pair)));
        }
        if to == Crs::WEB_MERCATOR {
            steps.push(Step::LonLatToMerc);
        }
        Ok(Self { from, to, steps })
    }

    pub fn transform(&self, c: Coord) -> Result<Coord> {
        self.steps.iter().try_fold(c, |c, step| match step {
            Step::MercToLonLat => Ok(merc_to_lonlat(c)),
            Step::LonLatToMerc => Ok(lonlat_to_merc(c)),
            Step::Proj(pair) => pair.transform(c).map_err(|reason| ZonalError::CrsTransform {
                from: self.from,
                to: self.to,
                x: c.x,
                y: c.y,
                reason,
            }),
        })
    }
}

fn mercator_to_wgs84(crs: Crs) -> Crs {
    if crs == Crs::WEB_MERCATOR {
        Crs::WGS84
    } else {
        crs
    }
}
