//! Zonal statistics over a georeferenced raster and a set of administrative
//! polygons: one eight-metric record per polygon, a percentile risk flag and
//! a run summary.

pub mod config;
pub mod crs;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod raster;
pub mod risk;
pub mod sampler;
pub mod stats;
pub mod summary;
pub mod table;

pub use config::EngineConfig;
pub use crs::{reconcile, Crs};
pub use error::{Result, ZonalError};
pub use geometry::{Coord, Polygon, PolygonCollection, PolygonId, PolygonPart, Ring};
pub use pipeline::{run, OutputRow, ZonalReport};
pub use raster::{GeoTransform, RasterGrid};
pub use risk::{classify, RiskClassification};
pub use sampler::{sample, CoveragePolicy};
pub use stats::{aggregate, Metric, StatsRecord, ZonalStats};
pub use summary::{summarize, SummaryMetadata};
pub use table::{build, StatisticsTable, ZonalRecord};
