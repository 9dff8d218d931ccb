//! Stage trait and stage-boundary errors.

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use auditor_core::Evidence;

use crate::config::TimeoutClass;
use crate::state::{Contribution, ErrorKind, RunState};

/// Why a stage produced no contribution.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("timed out after {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    #[error("panicked: {0}")]
    Panicked(String),

    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl StageError {
    /// Build a `Panicked` error from a task panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "unknown panic payload".to_string()
        };
        StageError::Panicked(message)
    }
}

/// One node of the workflow.
///
/// # Isolation Contract
/// - Reads the state snapshot it is given, never shared mutable state
/// - Returns everything it produced as a [`Contribution`]
/// - An `Err` is caught at the stage boundary and never ends the run
#[async_trait]
pub trait Stage: Send + Sync {
    /// Unique id within the graph.
    fn id(&self) -> &str;

    /// Timeout class for the whole stage; `None` runs without a stage-level limit.
    fn timeout_class(&self) -> Option<TimeoutClass> {
        None
    }

    /// How failures of this stage are classified in the error log.
    fn error_kind(&self) -> ErrorKind {
        ErrorKind::Stage
    }

    /// Placeholder evidence describing a failure of this stage.
    fn placeholder(&self, _error: &StageError) -> Option<Evidence> {
        None
    }

    /// Run the stage against a snapshot of the state.
    async fn run(&self, state: Arc<RunState>) -> anyhow::Result<Contribution>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StageError::Timeout(Duration::from_secs(300)).to_string(),
            "timed out after 5m"
        );

        let failed = StageError::Failed(anyhow::anyhow!("not a git repository").context("clone failed"));
        assert_eq!(failed.to_string(), "clone failed: not a git repository");
    }

    #[test]
    fn test_panic_payloads() {
        let from_str = StageError::from_panic(Box::new("boom"));
        assert_eq!(from_str.to_string(), "panicked: boom");

        let from_string = StageError::from_panic(Box::new(String::from("index out of bounds")));
        assert_eq!(from_string.to_string(), "panicked: index out of bounds");

        let other = StageError::from_panic(Box::new(42u32));
        assert_eq!(other.to_string(), "panicked: unknown panic payload");
    }
}
