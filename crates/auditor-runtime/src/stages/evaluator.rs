//! Evaluator stage: one persona scoring every criterion that has evidence.

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use auditor_core::{Criterion, Opinion, Persona, Rubric};

use crate::agents::{EvaluationRequest, Evaluator};
use crate::config::RuntimeConfig;
use crate::engine::{Stage, StageError};
use crate::prompts;
use crate::state::{Contribution, ErrorEntry, ErrorKind, RunState};

pub struct EvaluatorStage {
    id: String,
    persona: Persona,
    evaluator: Arc<dyn Evaluator>,
    rubric: Arc<Rubric>,
    call_timeout: Duration,
    evidence_per_prompt: usize,
    evidence_excerpt_chars: usize,
}

impl EvaluatorStage {
    pub fn new(
        persona: Persona,
        evaluator: Arc<dyn Evaluator>,
        rubric: Arc<Rubric>,
        config: &RuntimeConfig,
    ) -> Self {
        Self {
            id: Self::stage_id(persona),
            persona,
            evaluator,
            rubric,
            call_timeout: config.timeouts.evaluator,
            evidence_per_prompt: config.evidence_per_prompt,
            evidence_excerpt_chars: config.evidence_excerpt_chars,
        }
    }

    pub fn stage_id(persona: Persona) -> String {
        format!("evaluator_{}", persona.slug())
    }

    fn request(&self, criterion: &Criterion, state: &RunState) -> Option<EvaluationRequest> {
        let evidence = state.evidence_for(&criterion.evidence);
        if evidence.is_empty() {
            return None;
        }

        let summary = prompts::evidence_summary(
            &evidence,
            self.evidence_per_prompt,
            self.evidence_excerpt_chars,
        );
        Some(EvaluationRequest {
            persona: self.persona,
            criterion: criterion.clone(),
            system_prompt: prompts::system_prompt(self.persona),
            prompt: prompts::evaluation_prompt(criterion, &summary),
            evidence,
        })
    }

    /// One evaluator call, bounded by the call timeout. A panic only costs
    /// this persona/criterion pair.
    async fn call(&self, request: &EvaluationRequest) -> Result<Opinion, StageError> {
        let guarded = AssertUnwindSafe(self.evaluator.evaluate(request)).catch_unwind();
        match tokio::time::timeout(self.call_timeout, guarded).await {
            Ok(Ok(result)) => result.map_err(StageError::Failed),
            Ok(Err(payload)) => Err(StageError::from_panic(payload)),
            Err(_) => Err(StageError::Timeout(self.call_timeout)),
        }
    }

    /// Check an evaluator result, returning the opinion to keep and any error.
    fn accept(
        &self,
        criterion: &Criterion,
        outcome: Result<Opinion, StageError>,
    ) -> (Option<Opinion>, Option<String>) {
        let opinion = match outcome {
            Ok(opinion) => opinion,
            Err(e @ StageError::Timeout(_)) => return (None, Some(format!("{} {}", criterion.id, e))),
            Err(e) => return (None, Some(format!("{}: {}", criterion.id, e))),
        };

        if opinion.persona != self.persona || opinion.criterion != criterion.id {
            return (
                None,
                Some(format!(
                    "{}: discarded opinion addressed to {}/{}",
                    criterion.id, opinion.persona, opinion.criterion
                )),
            );
        }

        if opinion.effective_score().is_none() {
            let error = format!("{}: no parseable score in rationale", criterion.id);
            return (Some(opinion), Some(error));
        }

        (Some(opinion), None)
    }
}

#[async_trait]
impl Stage for EvaluatorStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn error_kind(&self) -> ErrorKind {
        ErrorKind::Scoring
    }

    async fn run(&self, state: Arc<RunState>) -> anyhow::Result<Contribution> {
        let id = self.id.as_str();
        let mut contribution = Contribution::new();
        let mut pending = Vec::new();

        for criterion in &self.rubric.criteria {
            match self.request(criterion, &state) {
                Some(request) => pending.push((criterion, request)),
                None => {
                    contribution =
                        contribution.trace(id, format!("{}: no evidence, skipped", criterion.id));
                }
            }
        }

        let calls = pending.iter().map(|(_, request)| self.call(request));
        let outcomes = join_all(calls).await;

        for ((criterion, _), outcome) in pending.iter().zip(outcomes) {
            let (opinion, error) = self.accept(criterion, outcome);

            if let Some(message) = error {
                tracing::warn!(stage = %id, error = %message, "Scoring error");
                contribution = contribution
                    .error(ErrorEntry::new(id, ErrorKind::Scoring, message.clone()))
                    .trace(id, format!("scoring error: {}", message));
            }

            if let Some(opinion) = opinion {
                let score = opinion
                    .effective_score()
                    .map_or_else(|| "unscored".to_string(), |s| format!("{}/5", s));
                contribution = contribution
                    .trace(id, format!("{}: {} ({})", criterion.id, score, opinion.verdict))
                    .opinions([opinion]);
            }
        }

        Ok(contribution)
    }
}
