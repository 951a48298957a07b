//! The EDA pipeline runner.

use chrono::{DateTime, Utc};
use eda_analysis::AnalysisError;
use eda_dataset::Frame;
use eda_providers::{LanguageModel, ProviderError};
use eda_types::{
    AnalysisSettings, DomainVerdict, EdaReport, EdaStrategy, FocusArea, PipelineState,
    ProblemType, StateError,
};
use serde::Serialize;
use tracing::Instrument;

use crate::agents;
use crate::graph::{Node, TransitionReceipt, receipt_is_legal, transition_receipt};
use crate::routing::{route_focus_area, route_problem_type};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition { from: Node, to: Node },
    #[error("{node} failed: {source}")]
    Model {
        node: Node,
        #[source]
        source: ProviderError,
    },
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("analysis task failed: {0}")]
    AnalysisTask(#[from] tokio::task::JoinError),
    #[error("dataset has no columns")]
    EmptyDataset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub settings: AnalysisSettings,
    /// Follow-up requests allowed per stage when a JSON reply fails to parse.
    pub repair_attempts: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            settings: AnalysisSettings::default(),
            repair_attempts: 1,
        }
    }
}

/// Everything a run produced, including partial results when it failed.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub state: PipelineState,
    /// Nodes in the order they were entered, `Start` first.
    pub visited: Vec<Node>,
    /// Problem type after routing (may differ from the domain expert's).
    pub problem_type: Option<ProblemType>,
    pub target: Option<String>,
    pub focus_area: Option<FocusArea>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineRun {
    pub(crate) fn started() -> Self {
        let now = Utc::now();
        Self {
            state: PipelineState::new(),
            visited: vec![Node::Start],
            problem_type: None,
            target: None,
            focus_area: None,
            error: None,
            started_at: now,
            finished_at: now,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.visited.last() == Some(&Node::End)
    }

    #[must_use]
    pub fn current(&self) -> Node {
        self.visited.last().copied().unwrap_or(Node::Start)
    }

    /// Move to `to`, provided the graph names a legal edge for it.
    fn advance(&mut self, to: Node) -> Result<TransitionReceipt, PipelineError> {
        let from = self.current();
        let receipt = transition_receipt(from, to)
            .filter(|receipt| receipt_is_legal(*receipt))
            .ok_or(PipelineError::IllegalTransition { from, to })?;
        tracing::debug!(
            from = %receipt.from(),
            to = %receipt.to(),
            edge = ?receipt.edge(),
            "Transition"
        );
        self.visited.push(receipt.to());
        Ok(receipt)
    }
}

pub struct Pipeline<M> {
    model: M,
    options: PipelineOptions,
}

impl<M: LanguageModel> Pipeline<M> {
    pub fn new(model: M, options: PipelineOptions) -> Self {
        Self { model, options }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run the whole graph. Failures are captured in [`PipelineRun::error`]
    /// next to whatever the earlier stages recorded.
    pub async fn run(&self, frame: &Frame) -> PipelineRun {
        let mut run = PipelineRun::started();
        if let Err(err) = self.execute(frame, &mut run).await {
            tracing::error!(node = %run.current(), error = %err, "Pipeline failed");
            run.error = Some(err.to_string());
        }
        run.finished_at = Utc::now();
        run
    }

    /// Like [`Pipeline::run`] but hands back the error value itself.
    pub async fn run_strict(&self, frame: &Frame) -> Result<PipelineRun, PipelineError> {
        let mut run = PipelineRun::started();
        self.execute(frame, &mut run).await?;
        run.finished_at = Utc::now();
        Ok(run)
    }

    async fn execute(&self, frame: &Frame, run: &mut PipelineRun) -> Result<(), PipelineError> {
        if frame.n_cols() == 0 {
            return Err(PipelineError::EmptyDataset);
        }
        let settings = &self.options.settings;
        let budget = settings.prompt_char_budget;
        let (rows, cols) = frame.shape();
        tracing::info!(rows, cols, "Starting EDA pipeline");

        // Domain expert
        run.advance(Node::ProblemType)?;
        let request = agents::domain_expert_request(
            &frame.head_json(settings.sample_rows),
            &frame.column_names(),
            budget,
        );
        let verdict: DomainVerdict =
            agents::ask_structured(&self.model, request, self.options.repair_attempts)
                .instrument(tracing::info_span!("node", node = %Node::ProblemType))
                .await
                .map_err(|source| model_error(Node::ProblemType, source))?;
        tracing::info!(
            problem_type = %verdict.problem_type,
            target = verdict.target().unwrap_or("<none>"),
            "Domain expert verdict"
        );
        run.state.record_domain_expert(verdict)?;

        // Profiler
        let route = route_problem_type(run.state.require_domain_expert()?, frame);
        run.advance(route.node)?;
        run.problem_type = Some(route.problem_type);
        run.target.clone_from(&route.target);
        let profile = {
            let _span = tracing::info_span!("node", node = %route.node).entered();
            eda_analysis::profile(frame, route.problem_type, route.target.as_deref())?
        };
        run.state.record_dataset_profiler(profile)?;

        // Profiling narrative
        run.advance(Node::ProfilingReport)?;
        let request =
            agents::profiling_report_request(run.state.require_dataset_profiler()?, budget);
        let narrative = agents::ask_text(&self.model, request)
            .instrument(tracing::info_span!("node", node = %Node::ProfilingReport))
            .await
            .map_err(|source| model_error(Node::ProfilingReport, source))?;
        run.state.record_profiling_report(narrative)?;

        // Strategy
        run.advance(Node::StrategyGenerator)?;
        let request = agents::strategy_request(
            run.state.require_domain_expert()?,
            run.state.require_dataset_profiler()?,
            budget,
        );
        let strategy: EdaStrategy =
            agents::ask_structured(&self.model, request, self.options.repair_attempts)
                .instrument(tracing::info_span!("node", node = %Node::StrategyGenerator))
                .await
                .map_err(|source| model_error(Node::StrategyGenerator, source))?;
        run.state.record_eda_strategy(strategy)?;

        // Executor
        let (node, area) = route_focus_area(run.state.require_eda_strategy()?);
        run.advance(node)?;
        run.focus_area = Some(area);
        let frame = frame.clone();
        let profile = run.state.require_dataset_profiler()?.clone();
        let problem_type = route.problem_type;
        let target = route.target.clone();
        let settings = *settings;
        let span = tracing::info_span!("node", node = %node);
        let output = tokio::task::spawn_blocking(move || {
            let _span = span.entered();
            eda_analysis::run_analysis(
                area,
                &frame,
                &profile,
                problem_type,
                target.as_deref(),
                &settings,
            )
        })
        .await??;
        run.state.record_eda_executor(output)?;

        // Report
        run.advance(Node::Report)?;
        let request = agents::report_request(
            route.problem_type,
            run.state.require_dataset_profiler()?,
            run.state.require_eda_strategy()?,
            run.state.require_eda_executor()?,
            budget,
        );
        let report: EdaReport =
            agents::ask_structured(&self.model, request, self.options.repair_attempts)
                .instrument(tracing::info_span!("node", node = %Node::Report))
                .await
                .map_err(|source| model_error(Node::Report, source))?;
        run.state.record_eda_report(report)?;

        run.advance(Node::End)?;
        tracing::info!(visited = run.visited.len(), "EDA pipeline finished");
        Ok(())
    }
}

fn model_error(node: Node, source: ProviderError) -> PipelineError {
    PipelineError::Model { node, source }
}

