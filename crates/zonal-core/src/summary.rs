//! Run-level summary derived from a finished table and its risk flags.
use serde::{Deserialize, Serialize};

use crate::geometry::PolygonId;
use crate::risk::RiskClassification;
use crate::stats::Metric;
use crate::table::StatisticsTable;

/// A unit referenced from the summary, with the mean that put it there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitMean {
    pub id: PolygonId,
    pub mean: f64,
}

/// Aggregate figures over all units. Computed once, after the table and the
/// risk classification are complete; never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    /// Σ(meanᵢ · countᵢ) / Σcountᵢ over units with data: the mean of all
    /// sampled cells, so large units weigh more than small ones.
    pub national_mean: Option<f64>,
    /// Lowest cell value sampled by any unit.
    pub national_min: Option<f64>,
    /// Highest cell value sampled by any unit.
    pub national_max: Option<f64>,
    pub total_units: usize,
    pub units_with_data: usize,
    pub at_risk_unit_count: usize,
    pub threshold_value_used: Option<f64>,
    pub risk_metric: Metric,
    pub risk_percentile: f64,
    pub lowest_mean_unit: Option<UnitMean>,
    pub highest_mean_unit: Option<UnitMean>,
    /// Unweighted mean of unit standard deviations (within-unit variability).
    pub mean_unit_std: Option<f64>,
}

impl SummaryMetadata {
    /// Share of units with at least one valid cell, in [0, 1].
    pub fn coverage(&self) -> f64 {
        if self.total_units == 0 {
            0.0
        } else {
            self.units_with_data as f64 / self.total_units as f64
        }
    }
}

/// Fold `table` and `risk` into the run summary.
pub fn summarize(table: &StatisticsTable, risk: &RiskClassification) -> SummaryMetadata {
    let mut cells = 0usize;
    let mut weighted = 0.0f64;
    let mut std_sum = 0.0f64;
    let mut with_data = 0usize;
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;
    let mut lowest: Option<UnitMean> = None;
    let mut highest: Option<UnitMean> = None;

    for r in table {
        let Some(s) = r.stats.summary() else {
            continue;
        };
        let n = r.stats.count();
        with_data += 1;
        cells += n;
        weighted += s.mean * n as f64;
        std_sum += s.std;
        min = Some(min.map_or(s.min, |m| m.min(s.min)));
        max = Some(max.map_or(s.max, |m| m.max(s.max)));
        // Strict comparisons: the first unit in input order wins a tie.
        if lowest.as_ref().map_or(true, |u| s.mean < u.mean) {
            lowest = Some(UnitMean { id: r.id.clone(), mean: s.mean });
        }
        if highest.as_ref().map_or(true, |u| s.mean > u.mean) {
            highest = Some(UnitMean { id: r.id.clone(), mean: s.mean });
        }
    }

    SummaryMetadata {
        national_mean: (cells > 0).then(|| weighted / cells as f64),
        national_min: min,
        national_max: max,
        total_units: table.len(),
        units_with_data: with_data,
        at_risk_unit_count: risk.at_risk_count(),
        threshold_value_used: risk.threshold,
        risk_metric: risk.metric,
        risk_percentile: risk.percentile,
        lowest_mean_unit: lowest,
        highest_mean_unit: highest,
        mean_unit_std: (with_data > 0).then(|| std_sum / with_data as f64),
    }
}
