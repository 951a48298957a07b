//! Integration test suites

mod pipeline;
mod provider;
