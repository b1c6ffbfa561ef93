//! Coordinate reference systems and vector-to-raster reconciliation.
//!
//! The vector layer is always the one reprojected: a few thousand polygon
//! vertices are cheaper to move than a regridded raster.
mod definitions;
mod transform;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Layer, Result, ZonalError};
use crate::geometry::{PolygonCollection, PolygonPart};

pub use transform::Transformer;

/// An EPSG-coded coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs(u32);

impl Crs {
    /// WGS84 geographic, (lon, lat) in degrees.
    pub const WGS84: Crs = Crs(4326);
    /// Spherical Web Mercator in metres.
    pub const WEB_MERCATOR: Crs = Crs(3857);

    pub const fn epsg(code: u32) -> Self {
        Crs(code)
    }

    /// WGS84 / UTM zone `zone` (1–60), north or south hemisphere.
    pub fn utm(zone: u8, south: bool) -> Self {
        Crs(if south { 32700 } else { 32600 } + u32::from(zone))
    }

    pub fn code(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised CRS identifier \"{0}\"")]
pub struct CrsParseError(pub String);

impl FromStr for Crs {
    type Err = CrsParseError;

    /// Accepts `EPSG:4326`, `epsg:4326`, `urn:ogc:def:crs:EPSG::4326`,
    /// `urn:ogc:def:crs:EPSG:6.6:4326` and the OGC `CRS84` aliases.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let t = s.trim();
        let upper = t.to_ascii_uppercase();
        if upper == "CRS84" || upper.ends_with(":CRS84") {
            return Ok(Crs::WGS84);
        }
        let code = if let Some(rest) = upper.strip_prefix("EPSG:") {
            rest
        } else if upper.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            upper.rsplit(':').next().unwrap_or_default()
        } else {
            return Err(CrsParseError(s.to_string()));
        };
        code.parse::<u32>().map(Crs).map_err(|_| CrsParseError(s.to_string()))
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsParseError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Crs> for String {
    fn from(c: Crs) -> Self {
        c.to_string()
    }
}

/// Express every polygon of `collection` in `raster_crs`.
///
/// Identical systems return the collection untouched, so coordinates stay
/// bit-identical. Either side undeclared fails with `CrsUndefined`; a code
/// without a definition fails with `CrsUnsupported`.
#[instrument(skip_all, fields(units = collection.len()))]
pub fn reconcile(raster_crs: Option<&Crs>, collection: PolygonCollection) -> Result<PolygonCollection> {
    let target = *raster_crs.ok_or(ZonalError::CrsUndefined { side: Layer::Raster })?;
    let source = collection.crs.ok_or(ZonalError::CrsUndefined { side: Layer::Polygons })?;

    if source == target {
        debug!(crs = %target, "polygon CRS already matches raster");
        return Ok(collection);
    }

    let tf = Transformer::new(source, target)?;
    debug!(from = %source, to = %target, "reprojecting polygon vertices");

    let polygons = collection
        .polygons
        .into_iter()
        .map(|mut p| -> Result<_> {
            p.parts = p
                .parts
                .iter()
                .map(|part| -> Result<PolygonPart> {
                    Ok(PolygonPart {
                        exterior: part.exterior.try_map_coords(|c| tf.transform(c))?,
                        holes: part
                            .holes
                            .iter()
                            .map(|h| h.try_map_coords(|c| tf.transform(c)))
                            .collect::<Result<_>>()?,
                    })
                })
                .collect::<Result<_>>()?;
            Ok(p)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PolygonCollection::new(Some(target), polygons))
}
