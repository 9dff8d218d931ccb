//! Synthesizer: resolves persona opinions into criterion results.
//!
//! Per criterion, the synthesizer applies fixed rules in order:
//! 1. Baseline: the highest persona score (missing personas count as 3)
//! 2. Security override: a security keyword in the Critical rationale caps at 3
//! 3. Functionality weight: a Pragmatic score >= 4 above the baseline adds 1
//! 4. Dissent: population variance of the valid scores > 2.0 attaches an explanation
//!
//! The same opinions always produce the same results. Nothing here reads
//! the clock or draws random numbers, except the report id and timestamp
//! added during report assembly.

pub mod rules;
pub mod summary;

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::evidence::{truncate_with_ellipsis, Evidence, EvidenceCategory};
use crate::opinion::{CriterionId, Opinion, Persona};
use crate::patterns;
use crate::report::{AuditReport, CriterionResult, Grade};
use crate::rubric::Rubric;

use rules::PersonaScores;

/// Maximum characters kept from each rationale in `findings`.
pub const FINDING_MAX_CHARS: usize = 200;

/// Finding recorded for a criterion whose opinions held no valid score.
pub const NO_VALID_SCORES: &str = "no valid scores";

/// Criterion results plus the criteria that could not be scored.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// One result per criterion that received at least one opinion
    pub results: Vec<CriterionResult>,

    /// Criteria whose opinions carried no valid score
    pub unscored: Vec<CriterionId>,
}

/// Inputs for report assembly besides the opinions.
#[derive(Debug, Clone)]
pub struct ReportRequest<'a> {
    pub title: &'a str,
    pub target: &'a str,
    pub opinions: &'a [Opinion],
    pub evidence_index: BTreeMap<EvidenceCategory, Vec<Evidence>>,
}

/// The Synthesizer turns opinions into results and the final report.
pub struct Synthesizer {
    rubric: Rubric,
}

impl Synthesizer {
    pub fn new(rubric: Rubric) -> Self {
        Self { rubric }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Synthesize one result per criterion present in `opinions`.
    ///
    /// Criteria appear in order of their first opinion. A criterion with no
    /// opinions does not appear at all.
    pub fn synthesize(&self, opinions: &[Opinion]) -> Synthesis {
        let mut grouped: Vec<(&CriterionId, Vec<&Opinion>)> = Vec::new();
        for opinion in opinions {
            match grouped.iter_mut().find(|(id, _)| *id == &opinion.criterion) {
                Some((_, group)) => group.push(opinion),
                None => grouped.push((&opinion.criterion, vec![opinion])),
            }
        }

        let mut results = Vec::with_capacity(grouped.len());
        let mut unscored = Vec::new();

        for (criterion, group) in grouped {
            match self.synthesize_criterion(criterion, &group) {
                Some(result) => results.push(result),
                None => {
                    unscored.push(criterion.clone());
                    results.push(unscored_result(criterion));
                }
            }
        }

        Synthesis { results, unscored }
    }

    /// Apply the synthesis rules to one criterion's opinions.
    ///
    /// Returns `None` when no opinion carries a valid score.
    pub fn synthesize_criterion(
        &self,
        criterion: &CriterionId,
        opinions: &[&Opinion],
    ) -> Option<CriterionResult> {
        let mut scores = PersonaScores::default();
        let mut critical_rationale: Option<&str> = None;

        for opinion in opinions {
            let Some(score) = opinion.effective_score() else {
                continue;
            };
            if scores.record(opinion.persona, score) && opinion.persona == Persona::Critical {
                critical_rationale = Some(opinion.rationale.as_str());
            }
        }

        if !scores.any_valid() {
            return None;
        }

        let baseline = rules::baseline(&scores);
        let security_flagged = critical_rationale.is_some_and(|text| patterns::mentions_security(text));
        let score = rules::security_override(baseline, security_flagged);
        let score = rules::functionality_weight(
            score,
            baseline,
            scores.resolved(Persona::Pragmatic),
        );

        let valid = scores.valid();
        let values: Vec<u8> = valid.iter().map(|(_, s)| *s).collect();
        let variance = rules::population_variance(&values);
        let dissent = if rules::needs_dissent(variance) {
            rules::dissent_explanation(&valid, variance)
        } else {
            None
        };

        tracing::debug!(
            criterion = %criterion,
            baseline,
            score,
            security_flagged,
            variance,
            "Criterion synthesized"
        );

        Some(CriterionResult {
            criterion: criterion.clone(),
            passed: score >= rules::PASS_SCORE,
            score: f64::from(score),
            findings: opinions
                .iter()
                .map(|o| truncate_with_ellipsis(&o.rationale, FINDING_MAX_CHARS))
                .collect(),
            evidence_refs: opinions.iter().map(|o| o.id.clone()).collect(),
            dissent,
        })
    }

    /// Assemble the final report from already-synthesized results.
    pub fn assemble(&self, synthesis: Synthesis, request: ReportRequest<'_>) -> AuditReport {
        let results = synthesis.results;
        let overall = summary::overall_score(&results);
        let grade = Grade::from_score(overall);
        let summary_text = summary::executive_summary(&results, overall, grade);
        let remediation = summary::remediation_plan(&results, &self.rubric);
        let short = Uuid::new_v4().simple().to_string();

        AuditReport {
            id: format!("audit_{}", &short[..12]),
            title: request.title.to_string(),
            summary: summary_text,
            overall_score: overall,
            grade,
            criterion_results: results,
            evidence_index: request.evidence_index,
            representative_opinion: request.opinions.last().cloned(),
            timestamp: Utc::now(),
            target: request.target.to_string(),
            remediation,
        }
    }

    /// Synthesize and assemble in one step.
    pub fn report(&self, request: ReportRequest<'_>) -> AuditReport {
        let synthesis = self.synthesize(request.opinions);
        self.assemble(synthesis, request)
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(Rubric::default())
    }
}

fn unscored_result(criterion: &CriterionId) -> CriterionResult {
    CriterionResult {
        criterion: criterion.clone(),
        passed: false,
        score: 1.0,
        findings: vec![NO_VALID_SCORES.to_string()],
        evidence_refs: vec![],
        dissent: None,
    }
}
