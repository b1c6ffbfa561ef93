pub mod aggregate;
pub mod percentile;

use serde::{Deserialize, Serialize};

pub use aggregate::{aggregate, NonFiniteValue, StatsRecord, Summary, ZonalStats};
pub use percentile::percentile;

/// The eight per-unit metrics, named as they appear in output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "mean")]
    Mean,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "std")]
    Std,
    #[serde(rename = "percentile_10")]
    Percentile10,
    #[serde(rename = "percentile_90")]
    Percentile90,
    #[serde(rename = "range")]
    Range,
}

impl Metric {
    /// Output column order.
    pub const ALL: [Metric; 8] = [
        Metric::Count,
        Metric::Mean,
        Metric::Min,
        Metric::Max,
        Metric::Std,
        Metric::Percentile10,
        Metric::Percentile90,
        Metric::Range,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Count => "count",
            Metric::Mean => "mean",
            Metric::Min => "min",
            Metric::Max => "max",
            Metric::Std => "std",
            Metric::Percentile10 => "percentile_10",
            Metric::Percentile90 => "percentile_90",
            Metric::Range => "range",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
