//! Dataset profile shared by the profiler and the LLM stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Basic structural facts about a dataset.
///
/// `class_imbalance` is only populated for classification problems and
/// `categorical_cardinality` is absent for regression problems.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub shape: (usize, usize),
    pub missing_values: BTreeMap<String, usize>,
    pub dtypes: BTreeMap<String, String>,
    pub class_imbalance: Option<BTreeMap<String, usize>>,
    pub categorical_cardinality: Option<BTreeMap<String, usize>>,
    pub duplicate_rows: Vec<usize>,
    pub duplicate_columns: Vec<String>,
    pub constant_columns: Vec<String>,
    pub all_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
}

impl DatasetProfile {
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.shape.0
    }

    #[must_use]
    pub const fn columns(&self) -> usize {
        self.shape.1
    }

    #[must_use]
    pub fn total_missing(&self) -> usize {
        self.missing_values.values().sum()
    }

    /// JSON text handed to the LLM stages.
    #[must_use]
    pub fn to_prompt_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
