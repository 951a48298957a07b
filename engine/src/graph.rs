//! Pipeline transition graph authority.
//!
//! This module is the single encoding point for the pipeline's nodes, the
//! named edges between them and legality checks. The runner asks for a
//! [`TransitionReceipt`] before every step and refuses to move without one.

use std::fmt;

use eda_types::{FocusArea, ProblemType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Start,
    ProblemType,
    ProfileRegression,
    ProfileClassification,
    ProfileClustering,
    ProfilingReport,
    StrategyGenerator,
    ExecuteDescriptive,
    ExecuteCorrelation,
    ExecuteOutliers,
    ExecuteFeatureRanking,
    Report,
    End,
}

impl Node {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Node::Start => "start",
            Node::ProblemType => "problem_type",
            Node::ProfileRegression => "profile_regression",
            Node::ProfileClassification => "profile_classification",
            Node::ProfileClustering => "profile_clustering",
            Node::ProfilingReport => "profiling_report",
            Node::StrategyGenerator => "strategy_generator",
            Node::ExecuteDescriptive => "execute_descriptive",
            Node::ExecuteCorrelation => "execute_correlation",
            Node::ExecuteOutliers => "execute_outliers",
            Node::ExecuteFeatureRanking => "execute_feature_ranking",
            Node::Report => "report",
            Node::End => "end",
        }
    }

    /// Profiler node for an (already resolved) problem type.
    #[must_use]
    pub const fn profiler_for(problem_type: ProblemType) -> Self {
        match problem_type {
            ProblemType::Regression => Node::ProfileRegression,
            ProblemType::Classification => Node::ProfileClassification,
            ProblemType::Clustering | ProblemType::Unknown => Node::ProfileClustering,
        }
    }

    #[must_use]
    pub const fn executor_for(area: FocusArea) -> Self {
        match area {
            FocusArea::DescriptiveAnalysis => Node::ExecuteDescriptive,
            FocusArea::CorrelationAnalysis => Node::ExecuteCorrelation,
            FocusArea::OutlierDetection => Node::ExecuteOutliers,
            FocusArea::FeatureRanking => Node::ExecuteFeatureRanking,
        }
    }

    #[must_use]
    pub const fn is_profiler(self) -> bool {
        matches!(
            self,
            Node::ProfileRegression | Node::ProfileClassification | Node::ProfileClustering
        )
    }

    #[must_use]
    pub const fn is_executor(self) -> bool {
        matches!(
            self,
            Node::ExecuteDescriptive
                | Node::ExecuteCorrelation
                | Node::ExecuteOutliers
                | Node::ExecuteFeatureRanking
        )
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Begin,
    RouteProblemType,
    SummarizeProfile,
    PlanStrategy,
    RouteFocusArea,
    WriteReport,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionReceipt {
    from: Node,
    edge: Edge,
    to: Node,
}

impl TransitionReceipt {
    #[must_use]
    pub const fn from(self) -> Node {
        self.from
    }

    #[must_use]
    pub const fn edge(self) -> Edge {
        self.edge
    }

    #[must_use]
    pub const fn to(self) -> Node {
        self.to
    }
}

#[must_use]
pub fn transition_receipt(from: Node, to: Node) -> Option<TransitionReceipt> {
    transition_edge(from, to).map(|edge| TransitionReceipt { from, edge, to })
}

#[must_use]
pub fn receipt_is_legal(receipt: TransitionReceipt) -> bool {
    is_legal_transition(receipt.from, receipt.edge, receipt.to)
}

#[must_use]
pub fn transition_edge(from: Node, to: Node) -> Option<Edge> {
    use Edge::{Begin, Finish, PlanStrategy, RouteFocusArea, RouteProblemType, SummarizeProfile,
        WriteReport};

    match (from, to) {
        (Node::Start, Node::ProblemType) => Some(Begin),
        (Node::ProblemType, to) if to.is_profiler() => Some(RouteProblemType),
        (from, Node::ProfilingReport) if from.is_profiler() => Some(SummarizeProfile),
        (Node::ProfilingReport, Node::StrategyGenerator) => Some(PlanStrategy),
        (Node::StrategyGenerator, to) if to.is_executor() => Some(RouteFocusArea),
        (from, Node::Report) if from.is_executor() => Some(WriteReport),
        (Node::Report, Node::End) => Some(Finish),
        _ => None,
    }
}

#[must_use]
pub fn is_legal_transition(from: Node, edge: Edge, to: Node) -> bool {
    match edge {
        Edge::Begin => from == Node::Start && to == Node::ProblemType,
        Edge::RouteProblemType => from == Node::ProblemType && to.is_profiler(),
        Edge::SummarizeProfile => from.is_profiler() && to == Node::ProfilingReport,
        Edge::PlanStrategy => from == Node::ProfilingReport && to == Node::StrategyGenerator,
        Edge::RouteFocusArea => from == Node::StrategyGenerator && to.is_executor(),
        Edge::WriteReport => from.is_executor() && to == Node::Report,
        Edge::Finish => from == Node::Report && to == Node::End,
    }
}
