//! Collector stage: wraps one [`Collector`] as a workflow node.

use async_trait::async_trait;
use std::sync::Arc;

use auditor_core::Evidence;

use crate::agents::{Collected, Collector};
use crate::config::TimeoutClass;
use crate::engine::{Stage, StageError};
use crate::state::{Contribution, ErrorEntry, ErrorKind, InputKind, RunState, StatusFlag};

pub struct CollectorStage {
    collector: Arc<dyn Collector>,
    placeholder_on_failure: bool,
}

impl CollectorStage {
    pub fn new(collector: Arc<dyn Collector>, placeholder_on_failure: bool) -> Self {
        Self {
            collector,
            placeholder_on_failure,
        }
    }

    fn status_flag(&self) -> StatusFlag {
        match self.collector.input() {
            InputKind::Repository => StatusFlag::RepositoryCollected,
            InputKind::Document => StatusFlag::DocumentCollected,
        }
    }
}

#[async_trait]
impl Stage for CollectorStage {
    fn id(&self) -> &str {
        self.collector.name()
    }

    fn timeout_class(&self) -> Option<TimeoutClass> {
        Some(self.collector.timeout_class())
    }

    fn error_kind(&self) -> ErrorKind {
        ErrorKind::Collection
    }

    fn placeholder(&self, error: &StageError) -> Option<Evidence> {
        Some(Evidence::placeholder(
            self.collector.placeholder_category(),
            self.collector.name(),
            error,
        ))
    }

    async fn run(&self, state: Arc<RunState>) -> anyhow::Result<Contribution> {
        let id = self.id();
        let kind = self.collector.input();

        let Some(reference) = state.target.input(kind) else {
            tracing::warn!(stage = %id, input = %kind, "Input not supplied, skipping collector");
            return Ok(Contribution::new()
                .trace(id, format!("skipped: no {} supplied", kind))
                .flag(self.status_flag(), false));
        };

        tracing::debug!(stage = %id, reference = %reference, "Collecting evidence");
        let Collected { evidence, error } = self.collector.collect(reference).await;

        let mut contribution = Contribution::new()
            .trace(id, format!("collected {} evidence from {}", evidence.len(), reference))
            .flag(self.status_flag(), error.is_none());

        if let Some(error) = error {
            let message = format!("{:#}", error);
            tracing::warn!(stage = %id, error = %message, collected = evidence.len(), "Collector reported an error");
            contribution = contribution
                .error(ErrorEntry::new(id, ErrorKind::Collection, message.clone()))
                .trace(id, format!("error: {}", message));

            if evidence.is_empty() && self.placeholder_on_failure {
                contribution = contribution
                    .trace(id, "recorded placeholder evidence")
                    .evidence([Evidence::placeholder(
                        self.collector.placeholder_category(),
                        reference,
                        &message,
                    )]);
            }
        }

        Ok(contribution.evidence(evidence))
    }
}
