//! Statistics table: one record per polygon, in input order.
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "threading")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{Result, ZonalError};
use crate::geometry::{Polygon, PolygonCollection, PolygonId};
use crate::raster::RasterGrid;
use crate::risk::RiskClassification;
use crate::sampler::{sample, CoveragePolicy};
use crate::stats::{aggregate, Metric, NonFiniteValue, ZonalStats};

/// A unit's statistics joined with its descriptive attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZonalRecord {
    pub id: PolygonId,
    pub attributes: BTreeMap<String, String>,
    pub stats: ZonalStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    Ascending,
    Descending,
}

/// Per-group rollup of a table split on one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub units: usize,
    pub units_with_data: usize,
    /// Cell-count weighted mean of unit means.
    pub mean: Option<f64>,
    pub at_risk: usize,
}

/// Ordered records keyed by polygon id. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsTable {
    records: Vec<ZonalRecord>,
    index: HashMap<PolygonId, usize>,
}

impl StatisticsTable {
    fn from_records(records: Vec<ZonalRecord>) -> Self {
        let index = records.iter().enumerate().map(|(i, r)| (r.id.clone(), i)).collect();
        Self { records, index }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ZonalRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: &PolygonId) -> Option<&ZonalRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Records that have data, paired with the value of `metric`.
    pub fn metric_values(&self, metric: Metric) -> impl Iterator<Item = (&ZonalRecord, f64)> {
        self.records
            .iter()
            .filter(|r| r.stats.has_data())
            .filter_map(move |r| r.stats.metric(metric).map(|v| (r, v)))
    }

    /// Up to `n` units with data, ordered by `metric`. Ties keep input order.
    pub fn ranked(&self, metric: Metric, n: usize, order: RankOrder) -> Vec<&ZonalRecord> {
        let mut rows: Vec<(&ZonalRecord, f64)> = self.metric_values(metric).collect();
        match order {
            RankOrder::Ascending => rows.sort_by(|a, b| a.1.total_cmp(&b.1)),
            RankOrder::Descending => rows.sort_by(|a, b| b.1.total_cmp(&a.1)),
        }
        rows.into_iter().take(n).map(|(r, _)| r).collect()
    }

    /// Sub-table of units whose `attribute` equals `value`, order preserved.
    pub fn filter(&self, attribute: &str, value: &str) -> StatisticsTable {
        let records = self
            .records
            .iter()
            .filter(|r| r.attributes.get(attribute).is_some_and(|v| v == value))
            .cloned()
            .collect();
        Self::from_records(records)
    }

    /// Roll units up by the value of `attribute`, sorted by group name.
    /// Units without the attribute are left out.
    pub fn group_by(&self, attribute: &str, risk: Option<&RiskClassification>) -> Vec<GroupSummary> {
        #[derive(Default)]
        struct Acc {
            units: usize,
            with_data: usize,
            weighted: f64,
            cells: usize,
            at_risk: usize,
        }

        let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
        for r in &self.records {
            let Some(key) = r.attributes.get(attribute) else {
                continue;
            };
            let acc = groups.entry(key.as_str()).or_default();
            acc.units += 1;
            if let Some(mean) = r.stats.mean() {
                acc.with_data += 1;
                acc.weighted += mean * r.stats.count() as f64;
                acc.cells += r.stats.count();
            }
            if risk.and_then(|rc| rc.is_at_risk(&r.id)) == Some(true) {
                acc.at_risk += 1;
            }
        }

        groups
            .into_iter()
            .map(|(group, acc)| GroupSummary {
                group: group.to_string(),
                units: acc.units,
                units_with_data: acc.with_data,
                mean: (acc.cells > 0).then(|| acc.weighted / acc.cells as f64),
                at_risk: acc.at_risk,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a StatisticsTable {
    type Item = &'a ZonalRecord;
    type IntoIter = std::slice::Iter<'a, ZonalRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn unit_stats(grid: &RasterGrid, polygon: &Polygon, policy: CoveragePolicy) -> Result<ZonalStats> {
    let values = sample(grid, polygon, policy);
    aggregate(&values).map_err(|NonFiniteValue(value)| ZonalError::InvalidInput {
        polygon: polygon.id.clone(),
        value,
    })
}

/// Sample and reduce every polygon of `collection` against `grid`.
///
/// The collection must already be in the grid's CRS. Fails before sampling
/// when two polygons share an id. Per-polygon work is independent and runs on
/// the rayon pool when the `threading` feature is on; results are collected by
/// input index so row order never depends on scheduling. Any failing unit
/// aborts the build and the first failure in input order is returned.
#[instrument(skip_all, fields(units = collection.len(), policy = ?policy))]
pub fn build(collection: &PolygonCollection, grid: &RasterGrid, policy: CoveragePolicy) -> Result<StatisticsTable> {
    collection.check_unique_ids()?;

    #[cfg(feature = "threading")]
    let results: Vec<Result<ZonalStats>> =
        collection.polygons.par_iter().map(|p| unit_stats(grid, p, policy)).collect();
    #[cfg(not(feature = "threading"))]
    let results: Vec<Result<ZonalStats>> =
        collection.polygons.iter().map(|p| unit_stats(grid, p, policy)).collect();

    let records = collection
        .polygons
        .iter()
        .zip(results)
        .map(|(p, stats)| {
            stats.map(|stats| ZonalRecord {
                id: p.id.clone(),
                attributes: p.attributes.clone(),
                stats,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let empty: Vec<&str> = records.iter().filter(|r| !r.stats.has_data()).map(|r| r.id.as_str()).collect();
    if !empty.is_empty() {
        warn!(ids = ?empty, "units without valid cells");
    }
    info!(units = records.len(), empty_units = empty.len(), "statistics table built");

    Ok(StatisticsTable::from_records(records))
}
