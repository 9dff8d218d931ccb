//! # auditor-core
//!
//! Deterministic data model and synthesis engine for the code auditor.
//!
//! This crate answers one question: given the opinions three evaluator
//! personas wrote about a target, what does the final report say?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same opinions always produce the same results
//! 2. **No model calls**: Synthesis is rule-based
//! 3. **Traceable**: Every result cites the opinions it was derived from
//! 4. **Typed**: Scores, personas and verdicts are closed types
//!
//! ## Example
//!
//! ```rust,ignore
//! use auditor_core::{Opinion, Persona, Rubric, Score, Synthesizer};
//!
//! let opinions = vec![
//!     Opinion::scored(Persona::Critical, "graph_orchestration", Score::new(2)?, "linear", vec![]),
//!     Opinion::scored(Persona::Charitable, "graph_orchestration", Score::new(4)?, "tried", vec![]),
//!     Opinion::scored(Persona::Pragmatic, "graph_orchestration", Score::new(3)?, "works", vec![]),
//! ];
//!
//! let synthesis = Synthesizer::new(Rubric::default()).synthesize(&opinions);
//! assert_eq!(synthesis.results[0].score, 4.0);
//! ```

pub mod evidence;
pub mod opinion;
pub mod patterns;
pub mod report;
pub mod rubric;
pub mod synthesizer;

// Re-export main types at crate root
pub use evidence::{Evidence, EvidenceBuilder, EvidenceCategory};
pub use opinion::{CriterionId, Opinion, Persona, Score, ScoreError, Verdict};
pub use report::{AuditReport, CriterionResult, Grade, RemediationItem, RemediationPlan};
pub use rubric::{Criterion, Rubric, RubricError};
pub use synthesizer::{ReportRequest, Synthesis, Synthesizer};

use std::collections::BTreeMap;

/// Synthesize opinions against a rubric and assemble the report.
///
/// # Arguments
///
/// * `rubric` - Criteria and remediation table
/// * `title` - Report title
/// * `target` - Reference to the audited repository or document
/// * `evidence` - Evidence gathered for the target, grouped by category
/// * `opinions` - Every opinion the evaluators produced
pub fn synthesize_report(
    rubric: &Rubric,
    title: &str,
    target: &str,
    evidence: BTreeMap<EvidenceCategory, Vec<Evidence>>,
    opinions: &[Opinion],
) -> AuditReport {
    Synthesizer::new(rubric.clone()).report(ReportRequest {
        title,
        target,
        opinions,
        evidence_index: evidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_report() {
        let opinions: Vec<Opinion> = Persona::ALL
            .iter()
            .map(|p| {
                Opinion::scored(*p, "report_accuracy", Score::new(4).unwrap(), "paths verified", vec![])
            })
            .collect();

        let mut evidence = BTreeMap::new();
        evidence.insert(
            EvidenceCategory::ReportAccuracy,
            vec![Evidence::new(EvidenceCategory::ReportAccuracy, "3 paths cited", "report.pdf")],
        );

        let report = synthesize_report(&Rubric::default(), "Audit", "repo", evidence, &opinions);

        assert_eq!(report.overall_score, 4.0);
        assert_eq!(report.grade, Grade::CompetentOrchestrator);
        assert!(report.remediation.is_no_action());
        assert_eq!(report.evidence_index[&EvidenceCategory::ReportAccuracy].len(), 1);
    }

    #[test]
    fn test_security_flag_blocks_top_grade() {
        let opinions = vec![
            Opinion::scored(
                Persona::Critical,
                "state_management_rigor",
                Score::new(5).unwrap(),
                "clean reducers, but a security hole in the shell tool",
                vec![],
            ),
            Opinion::scored(Persona::Charitable, "state_management_rigor", Score::new(5).unwrap(), "great", vec![]),
            Opinion::scored(Persona::Pragmatic, "state_management_rigor", Score::new(5).unwrap(), "works", vec![]),
        ];

        let report = synthesize_report(&Rubric::default(), "Audit", "repo", BTreeMap::new(), &opinions);

        assert_eq!(report.overall_score, 3.0);
        assert_eq!(report.grade, Grade::DevelopingEngineer);
    }
}
