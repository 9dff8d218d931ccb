//! Fan-in barrier stages.
//!
//! By the time a barrier runs, the engine has merged every upstream
//! contribution. Barriers only report what arrived.

use async_trait::async_trait;
use std::sync::Arc;

use auditor_core::Persona;

use crate::engine::Stage;
use crate::state::{Contribution, RunState, StatusFlag};

use super::{EVIDENCE_AGGREGATOR, OPINION_AGGREGATOR};

/// Barrier between the collectors and the evaluators.
pub struct EvidenceAggregator;

#[async_trait]
impl Stage for EvidenceAggregator {
    fn id(&self) -> &str {
        EVIDENCE_AGGREGATOR
    }

    async fn run(&self, state: Arc<RunState>) -> anyhow::Result<Contribution> {
        let id = EVIDENCE_AGGREGATOR;
        let mut contribution = Contribution::new().trace(
            id,
            format!("{} evidence items collected", state.evidence_count()),
        );

        for (category, items) in &state.evidence {
            contribution = contribution.trace(id, format!("  {}: {}", category, items.len()));
        }

        if !state.errors.is_empty() {
            contribution = contribution.trace(id, format!("{} errors during collection", state.errors.len()));
            for error in &state.errors {
                contribution = contribution.trace(id, format!("  - {}", error));
            }
        }

        tracing::debug!(
            evidence = state.evidence_count(),
            errors = state.errors.len(),
            "Evidence aggregated"
        );
        Ok(contribution.flag(StatusFlag::EvidenceAggregated, true))
    }
}

/// Barrier between the evaluators and synthesis.
pub struct OpinionAggregator;

#[async_trait]
impl Stage for OpinionAggregator {
    fn id(&self) -> &str {
        OPINION_AGGREGATOR
    }

    async fn run(&self, state: Arc<RunState>) -> anyhow::Result<Contribution> {
        let id = OPINION_AGGREGATOR;
        let mut contribution =
            Contribution::new().trace(id, format!("{} opinions rendered", state.opinions.len()));

        for persona in Persona::ALL {
            let count = state.opinions.iter().filter(|o| o.persona == persona).count();
            contribution = contribution.trace(id, format!("  {}: {}", persona, count));
        }

        tracing::debug!(opinions = state.opinions.len(), "Opinions aggregated");
        Ok(contribution.flag(StatusFlag::OpinionsAggregated, true))
    }
}
