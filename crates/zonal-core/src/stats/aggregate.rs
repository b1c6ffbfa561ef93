//! Reduction of a polygon's sampled cell values to its statistics record.
use serde::{Deserialize, Serialize};

use super::percentile::interpolate;
use super::Metric;

/// The seven value statistics of a non-empty sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation (divides by n).
    pub std: f64,
    pub percentile_10: f64,
    pub percentile_90: f64,
    /// max − min.
    pub range: f64,
}

/// Statistics of one polygon. `summary` is `None` exactly when `count == 0`:
/// a unit without valid cells has no statistics, never zero-valued ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "StatsRecord")]
pub struct ZonalStats {
    count: usize,
    summary: Option<Summary>,
}

impl ZonalStats {
    /// Record of a unit that covered no valid cells.
    pub fn empty() -> Self {
        Self { count: 0, summary: None }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.summary.is_some()
    }

    pub fn mean(&self) -> Option<f64> {
        self.summary.map(|s| s.mean)
    }

    pub fn min(&self) -> Option<f64> {
        self.summary.map(|s| s.min)
    }

    pub fn max(&self) -> Option<f64> {
        self.summary.map(|s| s.max)
    }

    pub fn std(&self) -> Option<f64> {
        self.summary.map(|s| s.std)
    }

    pub fn percentile_10(&self) -> Option<f64> {
        self.summary.map(|s| s.percentile_10)
    }

    pub fn percentile_90(&self) -> Option<f64> {
        self.summary.map(|s| s.percentile_90)
    }

    pub fn range(&self) -> Option<f64> {
        self.summary.map(|s| s.range)
    }

    /// Value of `metric`. `Count` is always defined; every other metric is
    /// `None` for an empty unit.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Count => Some(self.count as f64),
            Metric::Mean => self.mean(),
            Metric::Min => self.min(),
            Metric::Max => self.max(),
            Metric::Std => self.std(),
            Metric::Percentile10 => self.percentile_10(),
            Metric::Percentile90 => self.percentile_90(),
            Metric::Range => self.range(),
        }
    }
}

/// Flat, nullable view of [`ZonalStats`] for tabular and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std: Option<f64>,
    pub percentile_10: Option<f64>,
    pub percentile_90: Option<f64>,
    pub range: Option<f64>,
}

impl From<ZonalStats> for StatsRecord {
    fn from(s: ZonalStats) -> Self {
        Self {
            count: s.count,
            mean: s.mean(),
            min: s.min(),
            max: s.max(),
            std: s.std(),
            percentile_10: s.percentile_10(),
            percentile_90: s.percentile_90(),
            range: s.range(),
        }
    }
}

/// A value that should have been masked as no-data reached the reduction.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("non-finite value {0} in sample")]
pub struct NonFiniteValue(pub f64);

/// Reduce a polygon's valid cell values to its statistics.
///
/// An empty slice is valid input and yields [`ZonalStats::empty`]. Any NaN or
/// infinity is rejected: masking happens upstream, so one here means the
/// no-data sentinel was wrong.
pub fn aggregate(values: &[f64]) -> Result<ZonalStats, NonFiniteValue> {
    if let Some(&bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(NonFiniteValue(bad));
    }
    if values.is_empty() {
        return Ok(ZonalStats::empty());
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];

    let mean_raw = sorted.iter().sum::<f64>() / n as f64;
    let variance = sorted.iter().map(|&v| (v - mean_raw) * (v - mean_raw)).sum::<f64>() / n as f64;
    // Summation rounding can push the mean of a constant sample one ulp outside [min, max].
    let mean = mean_raw.clamp(min, max);

    Ok(ZonalStats {
        count: n,
        summary: Some(Summary {
            mean,
            min,
            max,
            std: variance.sqrt(),
            percentile_10: interpolate(&sorted, 10.0),
            percentile_90: interpolate(&sorted, 90.0),
            range: max - min,
        }),
    })
}
