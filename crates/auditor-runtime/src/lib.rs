//! # auditor-runtime
//!
//! Async workflow engine that drives an audit end to end.
//!
//! This crate runs the stage graph around the deterministic synthesis in
//! `auditor-core`:
//!
//! ```text
//! context -> {collectors} -> evidence barrier -> {Critical, Charitable, Pragmatic}
//!         -> opinion barrier -> synthesis
//! ```
//!
//! ## Important
//!
//! Collectors and evaluators are supplied by the caller through the
//! [`Collector`] and [`Evaluator`] traits. A failing, panicking or
//! timed-out stage is logged and the run continues; only a missing
//! target aborts a run.
//!
//! ## Example
//!
//! ```rust,ignore
//! use auditor_runtime::{AuditTarget, Auditor};
//!
//! let auditor = Auditor::builder()
//!     .collector(Arc::new(RepoCollector::new()))
//!     .collector(Arc::new(DocCollector::new()))
//!     .evaluator(Arc::new(LlmEvaluator::new(client)))
//!     .build()?;
//!
//! let (report, trace) = auditor
//!     .run_with_trace(AuditTarget::repository(url).with_document("report.pdf"))
//!     .await?;
//! ```

pub mod agents;
pub mod config;
pub mod engine;
pub mod orchestrator;
pub mod prompts;
pub mod stages;
pub mod state;

pub use agents::{Collected, Collector, EvaluationRequest, Evaluator};
pub use config::{ConfigError, RuntimeConfig, TimeoutClass, Timeouts};
pub use engine::{GraphDefinitionError, Stage, StageError, StageGraph, WorkflowEngine};
pub use orchestrator::{Auditor, AuditorBuilder};
pub use state::{
    AuditTarget, Contribution, ErrorEntry, ErrorKind, InputKind, RunState, StatusFlag, TraceEvent,
};

use auditor_core::RubricError;
use thiserror::Error;

/// Errors that end an audit before a report exists.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("No repository or document reference supplied")]
    Input,

    #[error("Invalid stage graph: {0}")]
    GraphDefinition(#[from] GraphDefinitionError),

    #[error("Invalid rubric: {0}")]
    Rubric(#[from] RubricError),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Run finished without a report")]
    MissingReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuditError::Input.to_string(),
            "No repository or document reference supplied"
        );

        let graph: AuditError = GraphDefinitionError::DuplicateStage("context".to_string()).into();
        assert_eq!(graph.to_string(), "Invalid stage graph: Duplicate stage ID: context");
    }
}
