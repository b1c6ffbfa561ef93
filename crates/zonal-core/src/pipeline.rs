//! Pipeline orchestrator: runs every stage in order.
//!
//! reconcile CRS → sample + aggregate per unit → table → risk flags → summary

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::EngineConfig;
use crate::crs::reconcile;
use crate::error::Result;
use crate::geometry::{PolygonCollection, PolygonId};
use crate::raster::RasterGrid;
use crate::risk::{classify, RiskClassification};
use crate::stats::StatsRecord;
use crate::summary::{summarize, SummaryMetadata};
use crate::table::{build, StatisticsTable};

/// Full output of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalReport {
    pub table: StatisticsTable,
    pub risk: RiskClassification,
    pub summary: SummaryMetadata,
}

/// One externally visible row: attributes ∪ statistics ∪ risk flag.
/// `at_risk` is `None` for units without data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow<'a> {
    pub id: &'a PolygonId,
    pub attributes: &'a BTreeMap<String, String>,
    #[serde(flatten)]
    pub stats: StatsRecord,
    pub at_risk: Option<bool>,
}

impl ZonalReport {
    /// Rows in input order.
    pub fn rows(&self) -> impl Iterator<Item = OutputRow<'_>> {
        self.table.iter().map(|r| OutputRow {
            id: &r.id,
            attributes: &r.attributes,
            stats: StatsRecord::from(r.stats),
            at_risk: self.risk.is_at_risk(&r.id),
        })
    }
}

/// Run the whole engine on one raster / polygon pair.
///
/// Any error aborts the run; no partial table is ever returned.
#[instrument(skip_all, fields(units = polygons.len(), width = grid.width(), height = grid.height()))]
pub fn run(grid: &RasterGrid, polygons: PolygonCollection, config: &EngineConfig) -> Result<ZonalReport> {
    let polygons = reconcile(grid.crs(), polygons)?;
    let table = build(&polygons, grid, config.coverage)?;
    let risk = classify(&table, config.risk_metric, config.risk_percentile)?;
    let summary = summarize(&table, &risk);
    info!(
        units = summary.total_units,
        with_data = summary.units_with_data,
        at_risk = summary.at_risk_unit_count,
        coverage = summary.coverage(),
        national_mean = ?summary.national_mean,
        "zonal run complete"
    );
    Ok(ZonalReport { table, risk, summary })
}
