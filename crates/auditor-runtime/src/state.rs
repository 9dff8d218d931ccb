//! Run State: the single mutable record of one audit run.
//!
//! Stages never mutate it directly. Each stage returns a [`Contribution`]
//! and the engine folds contributions in with [`RunState::merge`] at
//! barrier time, one field reducer at a time:
//! - evidence, opinions, errors, trace: append, preserving order
//! - status flags: last write wins
//! - report: last write wins

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use auditor_core::{AuditReport, Evidence, EvidenceCategory, Opinion};

/// What is being audited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTarget {
    /// Repository reference (URL or path)
    pub repository: Option<String>,

    /// Document reference (path to the accompanying report)
    pub document: Option<String>,
}

impl AuditTarget {
    pub fn repository(reference: impl Into<String>) -> Self {
        Self {
            repository: Some(reference.into()),
            document: None,
        }
    }

    pub fn with_document(mut self, reference: impl Into<String>) -> Self {
        self.document = Some(reference.into());
        self
    }

    /// Whether no usable reference was supplied.
    pub fn is_empty(&self) -> bool {
        present(&self.repository).is_none() && present(&self.document).is_none()
    }

    /// The reference for an input kind, ignoring blank strings.
    pub fn input(&self, kind: InputKind) -> Option<&str> {
        match kind {
            InputKind::Repository => present(&self.repository),
            InputKind::Document => present(&self.document),
        }
    }

    /// Single reference string used in the report.
    pub fn reference(&self) -> String {
        [present(&self.repository), present(&self.document)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// The input a collector reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Repository,
    Document,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Repository => write!(f, "repository"),
            InputKind::Document => write!(f, "document"),
        }
    }
}

/// Progress flags set by stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFlag {
    ContextBuilt,
    RepositoryCollected,
    DocumentCollected,
    EvidenceAggregated,
    OpinionsAggregated,
    Synthesized,
}

/// Class of a non-fatal error recorded in the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A collector failed or timed out
    Collection,

    /// An evaluator call failed or returned an unusable opinion
    Scoring,

    /// A criterion had no valid score
    Synthesis,

    /// Any other stage failed
    Stage,
}

/// One entry of the append-only error log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub stage: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorEntry {
    pub fn new(stage: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.kind, self.stage, self.message)
    }
}

/// One human-readable event of the execution trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub stage: String,
    pub message: String,
}

impl TraceEvent {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

/// The partial result a stage returns.
#[derive(Debug, Clone, Default)]
pub struct Contribution {
    pub evidence: Vec<Evidence>,
    pub opinions: Vec<Opinion>,
    pub errors: Vec<ErrorEntry>,
    pub trace: Vec<TraceEvent>,
    pub flags: Vec<(StatusFlag, bool)>,
    pub report: Option<AuditReport>,
}

impl Contribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace(mut self, stage: &str, message: impl Into<String>) -> Self {
        self.trace.push(TraceEvent::new(stage, message));
        self
    }

    pub fn error(mut self, entry: ErrorEntry) -> Self {
        self.errors.push(entry);
        self
    }

    pub fn flag(mut self, flag: StatusFlag, value: bool) -> Self {
        self.flags.push((flag, value));
        self
    }

    pub fn evidence(mut self, evidence: impl IntoIterator<Item = Evidence>) -> Self {
        self.evidence.extend(evidence);
        self
    }

    pub fn opinions(mut self, opinions: impl IntoIterator<Item = Opinion>) -> Self {
        self.opinions.extend(opinions);
        self
    }

    pub fn report(mut self, report: AuditReport) -> Self {
        self.report = Some(report);
        self
    }
}

/// Shared state of one run, owned by the workflow engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub target: AuditTarget,
    pub evidence: BTreeMap<EvidenceCategory, Vec<Evidence>>,
    pub opinions: Vec<Opinion>,
    pub errors: Vec<ErrorEntry>,
    pub trace: Vec<TraceEvent>,
    pub flags: BTreeMap<StatusFlag, bool>,
    pub report: Option<AuditReport>,
}

impl RunState {
    pub fn new(target: AuditTarget) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// Fold a stage contribution into the state.
    pub fn merge(&mut self, contribution: Contribution) {
        for evidence in contribution.evidence {
            self.evidence
                .entry(evidence.category)
                .or_default()
                .push(evidence);
        }
        self.opinions.extend(contribution.opinions);
        self.errors.extend(contribution.errors);
        self.trace.extend(contribution.trace);
        for (flag, value) in contribution.flags {
            self.flags.insert(flag, value);
        }
        if let Some(report) = contribution.report {
            self.report = Some(report);
        }
    }

    pub fn flag(&self, flag: StatusFlag) -> bool {
        self.flags.get(&flag).copied().unwrap_or(false)
    }

    /// Evidence for the given categories, in category order.
    pub fn evidence_for(&self, categories: &[EvidenceCategory]) -> Vec<Evidence> {
        categories
            .iter()
            .filter_map(|c| self.evidence.get(c))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn evidence_count(&self) -> usize {
        self.evidence.values().map(Vec::len).sum()
    }
}
