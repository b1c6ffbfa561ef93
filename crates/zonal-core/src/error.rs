//! Error taxonomy for the zonal statistics engine.

use crate::crs::Crs;
use crate::geometry::PolygonId;

/// Which layer of a reconciliation lacked a declared reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Raster,
    Polygons,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Raster => f.write_str("raster"),
            Layer::Polygons => f.write_str("polygon collection"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ZonalError {
    #[error("{side} has no declared coordinate reference system")]
    CrsUndefined { side: Layer },

    #[error("no transform path from {from} to {to}")]
    CrsUnsupported { from: Crs, to: Crs },

    /// A supported pair failed on a specific vertex.
    #[error("cannot transform ({x}, {y}) from {from} to {to}: {reason}")]
    CrsTransform { from: Crs, to: Crs, x: f64, y: f64, reason: String },

    /// Two input polygons share an identifier. Fatal before any sampling.
    #[error("polygon id \"{id}\" appears more than once")]
    PolygonIdConflict { id: PolygonId },

    /// A non-finite value survived no-data masking.
    #[error("non-finite cell value {value} sampled for polygon \"{polygon}\"")]
    InvalidInput { polygon: PolygonId, value: f64 },

    #[error("threshold percentile {value} is outside [0, 100]")]
    InvalidPercentile { value: f64 },

    #[error("invalid raster: {reason}")]
    InvalidRaster { reason: String },

    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },
}

pub type Result<T> = std::result::Result<T, ZonalError>;
