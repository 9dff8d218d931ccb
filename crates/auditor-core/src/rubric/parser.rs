//! Rubric parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::evidence::EvidenceCategory;
use crate::opinion::CriterionId;

/// Errors that can occur when parsing rubrics.
#[derive(Error, Debug)]
pub enum RubricError {
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Rubric validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// One axis of evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Criterion {
    /// Unique identifier (e.g., "graph_orchestration")
    pub id: CriterionId,

    /// Human-readable name
    pub name: String,

    /// Evidence categories evaluators see for this criterion
    pub evidence: Vec<EvidenceCategory>,

    /// Remediation steps when this criterion fails
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// The ordered set of criteria plus remediation data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rubric {
    /// Human-readable name
    pub name: String,

    /// Criteria in evaluation order
    pub criteria: Vec<Criterion>,

    /// Recommendations for failed criteria missing from the table
    #[serde(default)]
    pub default_recommendations: Vec<String>,
}

impl Rubric {
    /// Parse a rubric from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RubricError> {
        let rubric: Rubric = serde_yaml::from_str(yaml)?;
        rubric.validate()?;
        Ok(rubric)
    }

    /// Parse a rubric from JSON string.
    pub fn from_json(json: &str) -> Result<Self, RubricError> {
        let rubric: Rubric = serde_json::from_str(json)?;
        rubric.validate()?;
        Ok(rubric)
    }

    /// Validate the rubric structure.
    pub fn validate(&self) -> Result<(), RubricError> {
        if self.name.is_empty() {
            return Err(RubricError::MissingField("name".to_string()));
        }

        let mut seen = HashSet::new();
        for criterion in &self.criteria {
            if criterion.id.as_str().is_empty() {
                return Err(RubricError::MissingField("criteria[].id".to_string()));
            }
            if criterion.evidence.is_empty() {
                return Err(RubricError::ValidationError(format!(
                    "Criterion {} lists no evidence categories",
                    criterion.id
                )));
            }
            if !seen.insert(&criterion.id) {
                return Err(RubricError::ValidationError(format!(
                    "Duplicate criterion ID: {}",
                    criterion.id
                )));
            }
        }

        Ok(())
    }

    /// Get a criterion by id.
    pub fn criterion(&self, id: &CriterionId) -> Option<&Criterion> {
        self.criteria.iter().find(|c| &c.id == id)
    }

    /// Recommendations for a failed criterion.
    ///
    /// Falls back to `default_recommendations` for criteria with no entry.
    pub fn recommendations_for(&self, id: &CriterionId) -> &[String] {
        match self.criterion(id) {
            Some(criterion) if !criterion.recommendations.is_empty() => {
                &criterion.recommendations
            }
            _ => &self.default_recommendations,
        }
    }
}
