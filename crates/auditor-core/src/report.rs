//! Synthesis output: per-criterion results and the final audit report.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evidence::{Evidence, EvidenceCategory};
use crate::opinion::{CriterionId, Opinion};

/// Final outcome for one criterion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriterionResult {
    /// Criterion this result belongs to
    pub criterion: CriterionId,

    /// Whether the criterion was met (score >= 3)
    pub passed: bool,

    /// Final score on the 1.0 - 5.0 scale
    pub score: f64,

    /// Contributing rationales, truncated for display
    pub findings: Vec<String>,

    /// Ids of the contributing opinions
    pub evidence_refs: Vec<String>,

    /// Present when persona scores disagree beyond the variance threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dissent: Option<String>,
}

/// Overall grade band derived from the mean criterion score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    /// Mean score >= 4.5
    MasterThinker,
    /// Mean score >= 3.5
    CompetentOrchestrator,
    /// Mean score >= 2.5
    DevelopingEngineer,
    /// Everything below
    VibeCoding,
}

impl Grade {
    /// Band a mean score.
    pub fn from_score(score: f64) -> Self {
        if score >= 4.5 {
            Grade::MasterThinker
        } else if score >= 3.5 {
            Grade::CompetentOrchestrator
        } else if score >= 2.5 {
            Grade::DevelopingEngineer
        } else {
            Grade::VibeCoding
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::MasterThinker => "MASTER THINKER",
            Grade::CompetentOrchestrator => "COMPETENT ORCHESTRATOR",
            Grade::DevelopingEngineer => "DEVELOPING ENGINEER",
            Grade::VibeCoding => "VIBE CODING",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recommendations for one failed criterion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemediationItem {
    pub criterion: CriterionId,
    pub current_score: f64,
    pub recommendations: Vec<String>,
}

/// Recommendations for every failed criterion. Empty means no action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemediationPlan {
    pub items: Vec<RemediationItem>,
}

impl RemediationPlan {
    /// The plan used when nothing failed.
    pub fn no_action() -> Self {
        Self::default()
    }

    pub fn is_no_action(&self) -> bool {
        self.items.is_empty()
    }
}

/// Terminal artifact of an audit run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditReport {
    /// Unique identifier
    pub id: String,

    pub title: String,

    /// Executive summary text
    pub summary: String,

    /// Mean of the criterion scores (0.0 when nothing was scored)
    pub overall_score: f64,

    pub grade: Grade,

    /// One result per scored criterion
    pub criterion_results: Vec<CriterionResult>,

    /// All evidence, by category
    pub evidence_index: BTreeMap<EvidenceCategory, Vec<Evidence>>,

    /// Last opinion received, kept as a representative sample
    #[serde(default)]
    pub representative_opinion: Option<Opinion>,

    pub timestamp: DateTime<Utc>,

    /// Reference to the audited target (repository URL or document path)
    pub target: String,

    pub remediation: RemediationPlan,
}

impl AuditReport {
    /// Look up the result for a criterion.
    pub fn result_for(&self, criterion: &CriterionId) -> Option<&CriterionResult> {
        self.criterion_results
            .iter()
            .find(|r| &r.criterion == criterion)
    }

    /// Number of criteria that passed.
    pub fn passed_count(&self) -> usize {
        self.criterion_results.iter().filter(|r| r.passed).count()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
