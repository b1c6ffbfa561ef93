use serde::{Deserialize, Serialize};

use crate::sampler::CoveragePolicy;
use crate::stats::Metric;

/// Run parameters. Every field has a default, so a partial JSON document is
/// a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Cell selection rule. Default: cell centre.
    pub coverage: CoveragePolicy,
    /// Metric the risk threshold is computed over. Default: mean.
    pub risk_metric: Metric,
    /// Percentile of `risk_metric` used as the risk threshold, 0–100. Default: 10.
    pub risk_percentile: f64,
    /// Feature property holding the unit identifier. Default: "id".
    pub id_field: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coverage: CoveragePolicy::CellCenter,
            risk_metric: Metric::Mean,
            risk_percentile: 10.0,
            id_field: "id".to_string(),
        }
    }
}
