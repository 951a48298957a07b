use serde::{Deserialize, Serialize};

/// Final EDA report written by the report generator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdaReport {
    #[serde(default, alias = "Report")]
    pub report: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub modeling_implications: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl EdaReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.report.trim().is_empty()
            && self.key_insights.is_empty()
            && self.risks.is_empty()
            && self.modeling_implications.is_empty()
            && self.next_steps.is_empty()
    }
}
