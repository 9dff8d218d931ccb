//! Collector and evaluator contracts.

use async_trait::async_trait;

use auditor_core::{Criterion, Evidence, EvidenceCategory, Opinion, Persona};

use crate::config::TimeoutClass;
use crate::state::InputKind;

/// What a collector returns: evidence plus an optional non-fatal error.
///
/// A collector may return partial evidence together with an error; neither
/// side implies the other.
#[derive(Debug, Default)]
pub struct Collected {
    pub evidence: Vec<Evidence>,
    pub error: Option<anyhow::Error>,
}

impl Collected {
    pub fn ok(evidence: Vec<Evidence>) -> Self {
        Self {
            evidence,
            error: None,
        }
    }

    pub fn partial(evidence: Vec<Evidence>, error: anyhow::Error) -> Self {
        Self {
            evidence,
            error: Some(error),
        }
    }

    pub fn failed(error: anyhow::Error) -> Self {
        Self::partial(Vec::new(), error)
    }
}

/// Gathers evidence about one input of the audit target.
///
/// # Isolation Contract
/// - Works on its own copy of the target reference
/// - Never sees other collectors' evidence
#[async_trait]
pub trait Collector: Send + Sync {
    /// Name used as the stage id.
    fn name(&self) -> &str;

    /// Which target reference this collector reads.
    fn input(&self) -> InputKind;

    /// Stage-level timeout class.
    fn timeout_class(&self) -> TimeoutClass {
        match self.input() {
            InputKind::Repository => TimeoutClass::Clone,
            InputKind::Document => TimeoutClass::MetadataFetch,
        }
    }

    /// Category used for placeholder evidence when the collector fails.
    fn placeholder_category(&self) -> EvidenceCategory {
        EvidenceCategory::General
    }

    /// Collect evidence for `reference`.
    async fn collect(&self, reference: &str) -> Collected;
}

/// Everything an evaluator needs for one persona and one criterion.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub persona: Persona,
    pub criterion: Criterion,
    pub evidence: Vec<Evidence>,

    /// Base prompt plus persona prompt
    pub system_prompt: String,

    /// Criterion prompt with the evidence summary
    pub prompt: String,
}

/// Produces an opinion for one persona and one criterion.
///
/// The returned opinion should carry a typed score; the rationale's
/// `Score n/5` marker is only a fallback.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> anyhow::Result<Opinion>;
}
