//! The two conditional forks of the pipeline.

use eda_dataset::Frame;
use eda_types::{DomainVerdict, EdaStrategy, FocusArea, ProblemType};
use serde::Serialize;

use crate::graph::Node;

/// Where the problem-type fork sends the run, and with what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRoute {
    pub node: Node,
    /// Problem type the rest of the run works with.
    pub problem_type: ProblemType,
    /// Target column, only when it names a column of the dataset.
    pub target: Option<String>,
}

/// Resolve the profiler branch for a verdict.
///
/// `unknown` goes to the clustering branch. A supervised verdict whose
/// target is missing or not a column is downgraded to clustering too. A
/// regression on a non-numeric target is treated as classification.
#[must_use]
pub fn route_problem_type(verdict: &DomainVerdict, frame: &Frame) -> ProfileRoute {
    let target = verdict
        .target()
        .filter(|name| frame.column(name).is_some())
        .map(str::to_string);

    let problem_type = match verdict.problem_type {
        ProblemType::Unknown => {
            tracing::warn!("Problem type is unknown, profiling as clustering");
            ProblemType::Clustering
        }
        supervised if supervised.is_supervised() && target.is_none() => {
            tracing::warn!(
                problem_type = %supervised,
                target = verdict.target().unwrap_or("<none>"),
                "Target is not a dataset column, profiling as clustering"
            );
            ProblemType::Clustering
        }
        ProblemType::Regression
            if target
                .as_deref()
                .and_then(|name| frame.column(name))
                .is_some_and(|column| !column.is_numeric()) =>
        {
            tracing::warn!(
                target = target.as_deref().unwrap_or("<none>"),
                "Regression target is not numeric, profiling as classification"
            );
            ProblemType::Classification
        }
        other => other,
    };

    ProfileRoute {
        node: Node::profiler_for(problem_type),
        problem_type,
        target,
    }
}

/// Executor branch for a strategy: its first recognized focus area, or
/// descriptive analysis when there is none.
#[must_use]
pub fn route_focus_area(strategy: &EdaStrategy) -> (Node, FocusArea) {
    let area = strategy.primary_focus();
    let recognized = strategy
        .focus_areas
        .iter()
        .any(|raw| FocusArea::parse(raw).is_some());
    if !recognized {
        tracing::warn!(
            focus_areas = ?strategy.focus_areas,
            "No recognized focus area, running descriptive analysis"
        );
    }
    (Node::executor_for(area), area)
}
