//! File loading and report serialization around the zonal-core engine.

mod attribute_reader;
mod error;
mod polygon_reader;
mod raster_reader;
mod writer;

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::{info, instrument};
use zonal_core::{EngineConfig, ZonalReport};

pub use attribute_reader::{join_attributes, read_attributes, AttributeTable};
pub use error::IoError;
pub use polygon_reader::read_polygons;
pub use raster_reader::read_raster;
pub use writer::{ReportWriter, SUMMARY_FILE, TABLE_FILE};

pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, IoError> {
    let text = fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read an [`EngineConfig`] from JSON. Absent fields take their defaults;
/// unknown fields are rejected.
pub fn read_config(path: &Path) -> Result<EngineConfig, IoError> {
    load_json(path)
}

/// Load every input from disk, run the engine, and write
/// [`TABLE_FILE`] and [`SUMMARY_FILE`] into `out_dir`.
///
/// The attribute side table, when given, is keyed by the configured
/// `id_field` and joined onto the polygons before the run.
#[instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn run_files(
    config: &Path,
    raster: &Path,
    polygons: &Path,
    attributes: Option<&Path>,
    out_dir: &Path,
) -> anyhow::Result<ZonalReport> {
    let config = read_config(config).context("loading configuration")?;
    let grid = read_raster(raster).context("loading raster")?;
    let mut units = read_polygons(polygons, &config.id_field).context("loading polygons")?;

    if let Some(path) = attributes {
        let table = read_attributes(path, &config.id_field).context("loading attribute table")?;
        join_attributes(&mut units, &table);
    }

    let report = zonal_core::run(&grid, units, &config).context("computing zonal statistics")?;

    let writer = ReportWriter::new(out_dir).context("preparing output directory")?;
    writer.write_table(&report).context("writing statistics table")?;
    writer.write_summary(&report.summary).context("writing summary")?;

    info!(units = report.table.len(), at_risk = report.summary.at_risk_unit_count, "run written");
    Ok(report)
}
