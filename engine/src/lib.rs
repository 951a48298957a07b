//! Orchestration for the EDA agent.
//!
//! The pipeline walks a fixed graph: domain expert, one of three
//! profilers, a profiling narrative, the strategy generator, one of four
//! analysis executors, and the report writer. Every step is checked
//! against [`graph`] before it runs.

pub mod agents;
pub mod graph;
mod pipeline;
pub mod render;
mod routing;

pub use graph::{Edge, Node, TransitionReceipt};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, PipelineRun};
pub use routing::{ProfileRoute, route_focus_area, route_problem_type};
