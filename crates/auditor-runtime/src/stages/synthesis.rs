//! Final stage: runs the synthesizer over the accumulated opinions.

use async_trait::async_trait;
use std::sync::Arc;

use auditor_core::{ReportRequest, Synthesizer};

use crate::engine::Stage;
use crate::state::{Contribution, ErrorEntry, ErrorKind, RunState, StatusFlag};

use super::SYNTHESIS;

pub struct SynthesisStage {
    synthesizer: Arc<Synthesizer>,
    title: String,
}

impl SynthesisStage {
    pub fn new(synthesizer: Arc<Synthesizer>, title: impl Into<String>) -> Self {
        Self {
            synthesizer,
            title: title.into(),
        }
    }
}

#[async_trait]
impl Stage for SynthesisStage {
    fn id(&self) -> &str {
        SYNTHESIS
    }

    fn error_kind(&self) -> ErrorKind {
        ErrorKind::Synthesis
    }

    async fn run(&self, state: Arc<RunState>) -> anyhow::Result<Contribution> {
        let synthesis = self.synthesizer.synthesize(&state.opinions);

        let mut contribution = Contribution::new().trace(
            SYNTHESIS,
            format!("synthesized {} criteria", synthesis.results.len()),
        );
        for criterion in &synthesis.unscored {
            contribution = contribution.error(ErrorEntry::new(
                SYNTHESIS,
                ErrorKind::Synthesis,
                format!("{}: zero valid scores", criterion),
            ));
        }
        for result in synthesis.results.iter().filter(|r| r.dissent.is_some()) {
            contribution = contribution.trace(SYNTHESIS, format!("dissent on {}", result.criterion));
        }

        let target = state.target.reference();
        let report = self.synthesizer.assemble(
            synthesis,
            ReportRequest {
                title: &self.title,
                target: &target,
                opinions: &state.opinions,
                evidence_index: state.evidence.clone(),
            },
        );

        tracing::info!(
            report = %report.id,
            overall_score = report.overall_score,
            grade = %report.grade,
            "Audit report assembled"
        );

        Ok(contribution
            .trace(
                SYNTHESIS,
                format!(
                    "report {} assembled: {:.2}/5 ({})",
                    report.id, report.overall_score, report.grade
                ),
            )
            .flag(StatusFlag::Synthesized, true)
            .report(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditor_core::{Evidence, EvidenceCategory, Opinion, Persona, Score};
    use crate::state::AuditTarget;

    #[tokio::test]
    async fn test_report_is_contributed() {
        let mut state = RunState::new(AuditTarget::repository("repo").with_document("report.pdf"));
        state.merge(
            Contribution::new()
                .evidence([Evidence::new(EvidenceCategory::GraphOrchestration, "fan-out", "repo")])
                .opinions([
                    Opinion::scored(Persona::Critical, "graph_orchestration", Score::new(1).unwrap(), "linear", vec![]),
                    Opinion::scored(Persona::Charitable, "graph_orchestration", Score::new(3).unwrap(), "tried", vec![]),
                    Opinion::scored(Persona::Pragmatic, "graph_orchestration", Score::new(5).unwrap(), "works", vec![]),
                    Opinion::from_rationale(Persona::Critical, "report_accuracy", "no marker", vec![]),
                ]),
        );

        let stage = SynthesisStage::new(Arc::new(Synthesizer::default()), "Test Audit");
        let contribution = stage.run(Arc::new(state)).await.unwrap();

        let report = contribution.report.as_ref().unwrap();
        assert_eq!(report.title, "Test Audit");
        assert_eq!(report.target, "repo, report.pdf");
        assert_eq!(report.criterion_results.len(), 2);
        assert_eq!(report.evidence_index[&EvidenceCategory::GraphOrchestration].len(), 1);

        assert_eq!(contribution.errors.len(), 1);
        assert_eq!(contribution.errors[0].message, "report_accuracy: zero valid scores");
        assert!(contribution
            .trace
            .iter()
            .any(|t| t.message == "dissent on graph_orchestration"));
        assert_eq!(contribution.flags, vec![(StatusFlag::Synthesized, true)]);
    }
}
