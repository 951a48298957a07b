//! Deterministic analysis stages of the EDA pipeline.
//!
//! The profiler produces a [`DatasetProfile`] for the chosen problem type;
//! the executor runs exactly one statistical routine per focus area.

mod error;
mod mutual_info;
mod profiler;
mod stats;

use eda_dataset::Frame;
use eda_types::{AnalysisOutput, AnalysisSettings, DatasetProfile, FocusArea, ProblemType};

pub use error::AnalysisError;
pub use mutual_info::{NOT_APPLICABLE, rank_features};
pub use profiler::{profile, profile_classification, profile_clustering, profile_regression};
pub use stats::{correlation, describe, detect_outliers, pearson, quantile};

/// Run the routine behind `area`.
///
/// `target` is excluded from correlation and, through the profile's numeric
/// partition, from outlier detection.
pub fn run_analysis(
    area: FocusArea,
    frame: &Frame,
    profile: &DatasetProfile,
    problem_type: ProblemType,
    target: Option<&str>,
    settings: &AnalysisSettings,
) -> Result<AnalysisOutput, AnalysisError> {
    let _span = tracing::info_span!("analysis", area = area.as_str()).entered();
    let output = match area {
        FocusArea::DescriptiveAnalysis => AnalysisOutput::Descriptive(describe(frame)),
        FocusArea::CorrelationAnalysis => AnalysisOutput::Correlation(correlation(frame, target)),
        FocusArea::OutlierDetection => AnalysisOutput::Outliers(detect_outliers(
            frame,
            &profile.numeric_columns,
            settings.iqr_multiplier,
        )),
        FocusArea::FeatureRanking => {
            AnalysisOutput::FeatureRanking(rank_features(frame, target, problem_type, settings)?)
        }
    };
    tracing::info!("Analysis finished");
    Ok(output)
}
