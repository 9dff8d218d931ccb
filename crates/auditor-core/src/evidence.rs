//! Evidence records produced by collectors.
//!
//! Evidence is immutable once created. The workflow engine appends it to
//! the run state under its category and never mutates or removes it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confidence assigned to placeholder evidence describing a failed collector.
pub const PLACEHOLDER_CONFIDENCE: f64 = 0.3;

/// Category an evidence item is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceCategory {
    GitForensicAnalysis,
    GraphOrchestration,
    StateManagementRigor,
    TheoreticalDepth,
    ReportAccuracy,
    SwarmVisual,
    General,
}

impl EvidenceCategory {
    /// Every category, in index order.
    pub const ALL: [EvidenceCategory; 7] = [
        EvidenceCategory::GitForensicAnalysis,
        EvidenceCategory::GraphOrchestration,
        EvidenceCategory::StateManagementRigor,
        EvidenceCategory::TheoreticalDepth,
        EvidenceCategory::ReportAccuracy,
        EvidenceCategory::SwarmVisual,
        EvidenceCategory::General,
    ];

    /// Stable snake_case key, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceCategory::GitForensicAnalysis => "git_forensic_analysis",
            EvidenceCategory::GraphOrchestration => "graph_orchestration",
            EvidenceCategory::StateManagementRigor => "state_management_rigor",
            EvidenceCategory::TheoreticalDepth => "theoretical_depth",
            EvidenceCategory::ReportAccuracy => "report_accuracy",
            EvidenceCategory::SwarmVisual => "swarm_visual",
            EvidenceCategory::General => "general",
        }
    }
}

impl fmt::Display for EvidenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of evidence gathered about the audit target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    /// Unique identifier
    pub id: String,

    /// Category this evidence supports
    pub category: EvidenceCategory,

    /// The observed content
    pub content: String,

    /// Where the evidence comes from (URL, file path, ...)
    pub source: String,

    /// Confidence in the evidence (0.0 - 1.0)
    pub confidence: f64,

    /// Collector-specific metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// When the evidence was collected
    pub timestamp: DateTime<Utc>,
}

impl Evidence {
    /// Create evidence with full confidence and a generated id.
    pub fn new(
        category: EvidenceCategory,
        content: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        EvidenceBuilder::new(category, content).source(source).build()
    }

    /// Low-confidence evidence recording that a collector failed.
    pub fn placeholder(
        category: EvidenceCategory,
        source: impl Into<String>,
        failure: impl fmt::Display,
    ) -> Self {
        EvidenceBuilder::new(category, format!("{} collection failed: {}", category, failure))
            .source(source)
            .confidence(PLACEHOLDER_CONFIDENCE)
            .metadata("placeholder", "true")
            .build()
    }

    /// Whether this record stands in for a failed collector.
    pub fn is_placeholder(&self) -> bool {
        self.metadata.get("placeholder").map(String::as_str) == Some("true")
    }

    /// Content truncated to at most `max_chars` characters, with `...` appended when cut.
    pub fn excerpt(&self, max_chars: usize) -> String {
        truncate_with_ellipsis(&self.content, max_chars)
    }
}

/// Builder for evidence with a fluent API.
pub struct EvidenceBuilder {
    id: Option<String>,
    category: EvidenceCategory,
    content: String,
    source: String,
    confidence: f64,
    metadata: BTreeMap<String, String>,
    timestamp: Option<DateTime<Utc>>,
}

impl EvidenceBuilder {
    /// Start building evidence for a category.
    pub fn new(category: EvidenceCategory, content: impl Into<String>) -> Self {
        Self {
            id: None,
            category,
            content: content.into(),
            source: String::new(),
            confidence: 1.0,
            metadata: BTreeMap::new(),
            timestamp: None,
        }
    }

    /// Use an explicit id instead of a generated one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the source reference.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the confidence, clamped to [0, 1].
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Add a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Pin the timestamp.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the evidence.
    pub fn build(self) -> Evidence {
        let id = self.id.unwrap_or_else(|| {
            let short = Uuid::new_v4().simple().to_string();
            format!("{}_{}", self.category, &short[..8])
        });

        Evidence {
            id,
            category: self.category,
            content: self.content,
            source: self.source,
            confidence: self.confidence,
            metadata: self.metadata,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        }
    }
}

/// Truncate `text` to `max_chars` characters, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
