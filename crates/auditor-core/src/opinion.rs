//! Opinions rendered by evaluator personas.
//!
//! An opinion scores one criterion from one persona's point of view.
//! The typed `score` is the source of truth; the score marker embedded in
//! the rationale is only consulted when an evaluator did not supply one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::patterns;

/// Errors constructing a score.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("Score {0} is outside the 1-5 range")]
    OutOfRange(u8),
}

/// An integer score on the 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Score assumed for a persona that gave no opinion.
    pub const NEUTRAL: Score = Score(3);

    /// Create a score, rejecting values outside 1..=5.
    pub fn new(value: u8) -> Result<Self, ScoreError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScoreError::OutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = ScoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an evaluation criterion (e.g. "graph_orchestration").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriterionId(String);

impl CriterionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CriterionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The fixed set of evaluator roles.
///
/// Each persona shares the same evaluation capability but brings a
/// different bias to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// Adversarial: looks for gaps, security flaws and shortcuts.
    Critical,
    /// Forgiving: rewards effort and intent.
    Charitable,
    /// Objective: judges whether it works and is maintainable.
    Pragmatic,
}

impl Persona {
    /// All personas in synthesis order.
    pub const ALL: [Persona; 3] = [Persona::Critical, Persona::Charitable, Persona::Pragmatic];

    /// Upper-case tag used in rationale text, e.g. `[CRITICAL]`.
    pub fn tag(&self) -> &'static str {
        match self {
            Persona::Critical => "CRITICAL",
            Persona::Charitable => "CHARITABLE",
            Persona::Pragmatic => "PRAGMATIC",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Persona::Critical => "Critical",
            Persona::Charitable => "Charitable",
            Persona::Pragmatic => "Pragmatic",
        }
    }

    /// Lower-case slug used in generated ids.
    pub fn slug(&self) -> &'static str {
        match self {
            Persona::Critical => "critical",
            Persona::Charitable => "charitable",
            Persona::Pragmatic => "pragmatic",
        }
    }

    /// Position in `Persona::ALL`.
    pub fn index(&self) -> usize {
        match self {
            Persona::Critical => 0,
            Persona::Charitable => 1,
            Persona::Pragmatic => 2,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Verdict attached to an opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Approved,
    Conditional,
    Rejected,
}

impl Verdict {
    /// 1-2 reject, 3 is conditional, 4-5 approve.
    pub fn from_score(score: Score) -> Self {
        match score.value() {
            0..=2 => Verdict::Rejected,
            3 => Verdict::Conditional,
            _ => Verdict::Approved,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approved => "APPROVED",
            Verdict::Conditional => "CONDITIONAL",
            Verdict::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persona's opinion on one criterion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opinion {
    /// Unique identifier
    pub id: String,

    /// Criterion this opinion scores
    pub criterion: CriterionId,

    /// Persona that rendered it
    pub persona: Persona,

    /// APPROVED, CONDITIONAL or REJECTED
    pub verdict: Verdict,

    /// Structured score, when the evaluator supplied one
    #[serde(default)]
    pub score: Option<Score>,

    /// Free-text reasoning (carries a score marker)
    pub rationale: String,

    /// Ids of the evidence this opinion relies on
    #[serde(default)]
    pub cited_evidence: Vec<String>,

    /// Confidence in the opinion (0.0 - 1.0)
    pub confidence: f64,

    /// When the opinion was rendered
    pub timestamp: DateTime<Utc>,
}

impl Opinion {
    /// Default confidence for evaluator opinions.
    pub const DEFAULT_CONFIDENCE: f64 = 0.9;

    /// Build an opinion from a structured score.
    ///
    /// The rationale is written as `[TAG] Score n/5: argument` so the
    /// text stays self-describing when displayed on its own.
    pub fn scored(
        persona: Persona,
        criterion: impl Into<CriterionId>,
        score: Score,
        argument: impl AsRef<str>,
        cited_evidence: Vec<String>,
    ) -> Self {
        let criterion = criterion.into();
        let rationale = format!(
            "[{}] {}: {}",
            persona.tag(),
            patterns::score_marker(score),
            argument.as_ref()
        );

        Self {
            id: generate_id(persona, &criterion),
            criterion,
            persona,
            verdict: Verdict::from_score(score),
            score: Some(score),
            rationale,
            cited_evidence,
            confidence: Self::DEFAULT_CONFIDENCE,
            timestamp: Utc::now(),
        }
    }

    /// Build an opinion from rationale text alone.
    ///
    /// The verdict follows the embedded score marker, or is CONDITIONAL
    /// when the marker is missing or unparsable.
    pub fn from_rationale(
        persona: Persona,
        criterion: impl Into<CriterionId>,
        rationale: impl Into<String>,
        cited_evidence: Vec<String>,
    ) -> Self {
        let criterion = criterion.into();
        let rationale = rationale.into();
        let verdict = patterns::parse_score_marker(&rationale)
            .map(Verdict::from_score)
            .unwrap_or(Verdict::Conditional);

        Self {
            id: generate_id(persona, &criterion),
            criterion,
            persona,
            verdict,
            score: None,
            rationale,
            cited_evidence,
            confidence: Self::DEFAULT_CONFIDENCE,
            timestamp: Utc::now(),
        }
    }

    /// Override the confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Override the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// The score used for synthesis: the typed score, else the rationale marker.
    pub fn effective_score(&self) -> Option<Score> {
        self.score
            .or_else(|| patterns::parse_score_marker(&self.rationale))
    }
}

fn generate_id(persona: Persona, criterion: &CriterionId) -> String {
    let short = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", persona.slug(), criterion, &short[..8])
}
