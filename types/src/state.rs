//! Request-scoped record threaded through every pipeline stage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AnalysisOutput, DatasetProfile, DomainVerdict, EdaReport, EdaStrategy};

/// Names of the state fields, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    DomainExpert,
    DatasetProfiler,
    ProfilingReport,
    EdaStrategy,
    EdaExecutor,
    EdaReport,
}

impl StateField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StateField::DomainExpert => "domain_expert",
            StateField::DatasetProfiler => "dataset_profiler",
            StateField::ProfilingReport => "profiling_report",
            StateField::EdaStrategy => "eda_strategy",
            StateField::EdaExecutor => "eda_executor",
            StateField::EdaReport => "eda_report",
        }
    }
}

impl std::fmt::Display for StateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("state field `{0}` was already recorded")]
    AlreadyRecorded(StateField),
    #[error("state field `{0}` has not been recorded yet")]
    Missing(StateField),
}

/// Pipeline state. Every field starts empty and is written at most once.
///
/// Fields are private so the only way in is through the `record_*`
/// methods, which reject a second write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineState {
    domain_expert: Option<DomainVerdict>,
    dataset_profiler: Option<DatasetProfile>,
    profiling_report: Option<String>,
    eda_strategy: Option<EdaStrategy>,
    eda_executor: Option<AnalysisOutput>,
    eda_report: Option<EdaReport>,
}

fn record<T>(slot: &mut Option<T>, value: T, field: StateField) -> Result<(), StateError> {
    if slot.is_some() {
        return Err(StateError::AlreadyRecorded(field));
    }
    *slot = Some(value);
    Ok(())
}

impl PipelineState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_domain_expert(&mut self, verdict: DomainVerdict) -> Result<(), StateError> {
        record(&mut self.domain_expert, verdict, StateField::DomainExpert)
    }

    pub fn record_dataset_profiler(&mut self, profile: DatasetProfile) -> Result<(), StateError> {
        record(&mut self.dataset_profiler, profile, StateField::DatasetProfiler)
    }

    pub fn record_profiling_report(&mut self, text: String) -> Result<(), StateError> {
        record(&mut self.profiling_report, text, StateField::ProfilingReport)
    }

    pub fn record_eda_strategy(&mut self, strategy: EdaStrategy) -> Result<(), StateError> {
        record(&mut self.eda_strategy, strategy, StateField::EdaStrategy)
    }

    pub fn record_eda_executor(&mut self, output: AnalysisOutput) -> Result<(), StateError> {
        record(&mut self.eda_executor, output, StateField::EdaExecutor)
    }

    pub fn record_eda_report(&mut self, report: EdaReport) -> Result<(), StateError> {
        record(&mut self.eda_report, report, StateField::EdaReport)
    }

    #[must_use]
    pub fn domain_expert(&self) -> Option<&DomainVerdict> {
        self.domain_expert.as_ref()
    }

    #[must_use]
    pub fn dataset_profiler(&self) -> Option<&DatasetProfile> {
        self.dataset_profiler.as_ref()
    }

    #[must_use]
    pub fn profiling_report(&self) -> Option<&str> {
        self.profiling_report.as_deref()
    }

    #[must_use]
    pub fn eda_strategy(&self) -> Option<&EdaStrategy> {
        self.eda_strategy.as_ref()
    }

    #[must_use]
    pub fn eda_executor(&self) -> Option<&AnalysisOutput> {
        self.eda_executor.as_ref()
    }

    #[must_use]
    pub fn eda_report(&self) -> Option<&EdaReport> {
        self.eda_report.as_ref()
    }

    pub fn require_domain_expert(&self) -> Result<&DomainVerdict, StateError> {
        self.domain_expert()
            .ok_or(StateError::Missing(StateField::DomainExpert))
    }

    pub fn require_dataset_profiler(&self) -> Result<&DatasetProfile, StateError> {
        self.dataset_profiler()
            .ok_or(StateError::Missing(StateField::DatasetProfiler))
    }

    pub fn require_eda_strategy(&self) -> Result<&EdaStrategy, StateError> {
        self.eda_strategy()
            .ok_or(StateError::Missing(StateField::EdaStrategy))
    }

    pub fn require_eda_executor(&self) -> Result<&AnalysisOutput, StateError> {
        self.eda_executor()
            .ok_or(StateError::Missing(StateField::EdaExecutor))
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineState, StateError, StateField};
    use crate::{DomainVerdict, ProblemType};

    #[test]
    fn fields_start_empty() {
        let state = PipelineState::new();
        assert!(state.domain_expert().is_none());
        assert!(state.dataset_profiler().is_none());
        assert!(state.eda_report().is_none());
        assert_eq!(
            state.require_eda_strategy(),
            Err(StateError::Missing(StateField::EdaStrategy))
        );
    }

    #[test]
    fn second_write_is_rejected() {
        let mut state = PipelineState::new();
        state
            .record_domain_expert(DomainVerdict::new(ProblemType::Clustering, None))
            .unwrap();
        let err = state
            .record_domain_expert(DomainVerdict::new(ProblemType::Regression, Some("y")))
            .unwrap_err();
        assert_eq!(err, StateError::AlreadyRecorded(StateField::DomainExpert));
        assert_eq!(
            state.domain_expert().map(|v| v.problem_type),
            Some(ProblemType::Clustering)
        );
    }

    #[test]
    fn serializes_every_field_name() {
        let json = serde_json::to_value(PipelineState::new()).unwrap();
        for field in [
            StateField::DomainExpert,
            StateField::DatasetProfiler,
            StateField::ProfilingReport,
            StateField::EdaStrategy,
            StateField::EdaExecutor,
            StateField::EdaReport,
        ] {
            assert!(json.get(field.as_str()).is_some(), "missing {field}");
        }
    }
}
