use serde::{Deserialize, Serialize};

/// Tunables for profiling, the statistical routines and prompt sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Fence multiplier for IQR outlier detection.
    pub iqr_multiplier: f64,
    /// Neighbors used by the k-NN mutual information estimators.
    pub mi_neighbors: usize,
    /// Rows kept (evenly spaced) before estimating mutual information.
    pub mi_max_rows: usize,
    /// Rows shown to the domain expert.
    pub sample_rows: usize,
    /// Upper bound on characters of data embedded in a single prompt.
    pub prompt_char_budget: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            mi_neighbors: 3,
            mi_max_rows: 5000,
            sample_rows: 5,
            prompt_char_budget: 12_000,
        }
    }
}
