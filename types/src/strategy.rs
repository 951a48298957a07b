//! Analysis strategy produced by the strategy generator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four analyses the executor knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    DescriptiveAnalysis,
    CorrelationAnalysis,
    OutlierDetection,
    FeatureRanking,
}

impl FocusArea {
    pub const ALL: [FocusArea; 4] = [
        FocusArea::DescriptiveAnalysis,
        FocusArea::CorrelationAnalysis,
        FocusArea::OutlierDetection,
        FocusArea::FeatureRanking,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FocusArea::DescriptiveAnalysis => "descriptive_analysis",
            FocusArea::CorrelationAnalysis => "correlation_analysis",
            FocusArea::OutlierDetection => "outlier_detection",
            FocusArea::FeatureRanking => "feature_ranking",
        }
    }

    /// Parse a focus area, tolerating case, spaces and hyphens.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        Self::ALL
            .into_iter()
            .find(|area| area.as_str() == normalized)
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured EDA plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdaStrategy {
    #[serde(default, alias = "Report")]
    pub report: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub analysis_to_run: Vec<String>,
    #[serde(default)]
    pub analysis_to_skip: Vec<String>,
    #[serde(default)]
    pub priority_order: Vec<String>,
}

impl EdaStrategy {
    /// The first focus area that names a known analysis.
    ///
    /// Falls back to descriptive analysis when the list is empty or holds
    /// nothing recognizable.
    #[must_use]
    pub fn primary_focus(&self) -> FocusArea {
        self.focus_areas
            .iter()
            .find_map(|area| FocusArea::parse(area))
            .unwrap_or(FocusArea::DescriptiveAnalysis)
    }
}

#[cfg(test)]
mod tests {
    use super::{EdaStrategy, FocusArea};

    #[test]
    fn focus_area_parse_tolerates_formatting() {
        assert_eq!(
            FocusArea::parse("Outlier Detection"),
            Some(FocusArea::OutlierDetection)
        );
        assert_eq!(
            FocusArea::parse("feature-ranking"),
            Some(FocusArea::FeatureRanking)
        );
        assert_eq!(FocusArea::parse("clustering"), None);
    }

    #[test]
    fn primary_focus_skips_unknown_entries() {
        let strategy = EdaStrategy {
            focus_areas: vec!["data cleaning".into(), "correlation_analysis".into()],
            ..EdaStrategy::default()
        };
        assert_eq!(strategy.primary_focus(), FocusArea::CorrelationAnalysis);
    }

    #[test]
    fn primary_focus_defaults_to_descriptive() {
        assert_eq!(
            EdaStrategy::default().primary_focus(),
            FocusArea::DescriptiveAnalysis
        );
    }

    #[test]
    fn strategy_accepts_capitalized_report_key() {
        let strategy: EdaStrategy = serde_json::from_str(
            r#"{"Report": "plan", "focus_areas": ["feature_ranking"], "red_flags": []}"#,
        )
        .unwrap();
        assert_eq!(strategy.report, "plan");
        assert!(strategy.priority_order.is_empty());
        assert_eq!(strategy.primary_focus(), FocusArea::FeatureRanking);
    }
}
