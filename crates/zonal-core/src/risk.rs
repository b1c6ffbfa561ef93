//! Percentile-threshold risk flags.
//!
//! The threshold is the linear-interpolation percentile of one metric across
//! every unit with data. A unit is at risk when its value is less than or
//! equal to the threshold, so ties at the threshold are flagged. Units without
//! data are neither at risk nor safe: they do not appear in the mapping.
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{Result, ZonalError};
use crate::geometry::PolygonId;
use crate::stats::{percentile, Metric};
use crate::table::StatisticsTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskClassification {
    pub metric: Metric,
    pub percentile: f64,
    /// `None` when no unit had data.
    pub threshold: Option<f64>,
    flags: BTreeMap<PolygonId, bool>,
}

impl RiskClassification {
    /// `Some(flag)` for a classified unit, `None` for a unit without data or
    /// an unknown id.
    pub fn is_at_risk(&self, id: &PolygonId) -> Option<bool> {
        self.flags.get(id).copied()
    }

    pub fn at_risk_count(&self) -> usize {
        self.flags.values().filter(|&&f| f).count()
    }

    pub fn classified_count(&self) -> usize {
        self.flags.len()
    }
}

/// Flag every unit whose `metric` is at or below the `threshold_percentile`-th
/// percentile of that metric over the table.
#[instrument(skip(table), fields(units = table.len()))]
pub fn classify(table: &StatisticsTable, metric: Metric, threshold_percentile: f64) -> Result<RiskClassification> {
    if !(0.0..=100.0).contains(&threshold_percentile) {
        return Err(ZonalError::InvalidPercentile { value: threshold_percentile });
    }

    let values: Vec<(&PolygonId, f64)> = table.metric_values(metric).map(|(r, v)| (&r.id, v)).collect();
    let mut sorted: Vec<f64> = values.iter().map(|&(_, v)| v).collect();
    sorted.sort_by(f64::total_cmp);

    let threshold = percentile(&sorted, threshold_percentile);
    let flags = match threshold {
        Some(t) => values.into_iter().map(|(id, v)| (id.clone(), v <= t)).collect(),
        None => BTreeMap::new(),
    };

    let rc = RiskClassification {
        metric,
        percentile: threshold_percentile,
        threshold,
        flags,
    };
    info!(
        threshold = ?rc.threshold,
        at_risk = rc.at_risk_count(),
        classified = rc.classified_count(),
        "risk classification done"
    );
    Ok(rc)
}
