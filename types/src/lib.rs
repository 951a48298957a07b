//! Core domain types for the EDA agent.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod analysis;
mod model;
mod problem;
mod profile;
mod report;
mod settings;
mod state;
mod strategy;

pub use analysis::{
    AnalysisOutput, ColumnOutliers, ColumnSummary, CorrelationMatrix, FeatureRanking,
    FeatureScore,
};
pub use model::{ApiKey, ModelName, ModelNameKind, ModelParseError, Provider, ProviderParseError};
pub use problem::{DomainVerdict, ProblemType};
pub use profile::DatasetProfile;
pub use report::EdaReport;
pub use settings::AnalysisSettings;
pub use state::{PipelineState, StateError, StateField};
pub use strategy::{EdaStrategy, FocusArea};

/// Truncate `text` to at most `max_chars` characters, appending an ellipsis
/// when something was cut.
#[must_use]
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::truncate_with_ellipsis;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_with_ellipsis("abc", 10), "abc");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_with_ellipsis("ééééé", 4), "é...");
    }
}
