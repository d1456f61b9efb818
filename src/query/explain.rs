//! Execution traces for query debugging.

use serde::{Deserialize, Serialize};

use super::result::SearchResult;

/// One named, timed step of query execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainStep {
    /// Step name, e.g. `query_parsing` or `term_lookup`.
    pub name: String,
    /// Human-readable description of what the step did.
    pub description: String,
    /// Elapsed wall-clock time for the step.
    pub elapsed_ms: f64,
}

/// Ordered record of the internal steps taken to answer a query.
///
/// The traced execution runs the real search path, so `results` carries the
/// same ranked order `search()` would produce for the same query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationTrace {
    /// Steps in execution order.
    pub steps: Vec<ExplainStep>,
    /// Total elapsed time across all steps.
    pub total_ms: f64,
    /// The ranked results the traced execution produced.
    pub results: Vec<SearchResult>,
}

impl ExplanationTrace {
    /// Look up a step by name.
    pub fn step(&self, name: &str) -> Option<&ExplainStep> {
        self.steps.iter().find(|s| s.name == name)
    }
}
