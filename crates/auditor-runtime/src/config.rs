//! Runtime configuration.
//!
//! Durations are written as human-readable strings (`"300s"`, `"1m 30s"`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Timeout class of a stage, mapped to a configured duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    /// Long-running fetches such as cloning a repository
    Clone,

    /// Short lookups such as reading document metadata
    MetadataFetch,
}

/// Per-stage and per-call timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(with = "humantime_duration")]
    pub clone_class: Duration,

    #[serde(with = "humantime_duration")]
    pub metadata_class: Duration,

    /// Limit for one evaluator call (one persona, one criterion)
    #[serde(with = "humantime_duration")]
    pub evaluator: Duration,

    /// Overrides keyed by stage id
    #[serde(with = "humantime_duration_map")]
    pub per_stage: BTreeMap<String, Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            clone_class: Duration::from_secs(300),
            metadata_class: Duration::from_secs(30),
            evaluator: Duration::from_secs(30),
            per_stage: BTreeMap::new(),
        }
    }
}

impl Timeouts {
    /// Duration for a class.
    pub fn for_class(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Clone => self.clone_class,
            TimeoutClass::MetadataFetch => self.metadata_class,
        }
    }

    /// Timeout for a stage: an explicit override wins, then the class.
    ///
    /// `None` means the stage runs without a stage-level limit.
    pub fn for_stage(&self, stage: &str, class: Option<TimeoutClass>) -> Option<Duration> {
        self.per_stage
            .get(stage)
            .copied()
            .or_else(|| class.map(|c| self.for_class(c)))
    }
}

/// Configuration for an audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub report_title: String,

    pub timeouts: Timeouts,

    /// Add a low-confidence placeholder evidence record when a collector fails
    pub placeholder_evidence_on_failure: bool,

    /// Evidence items included in one evaluator prompt
    pub evidence_per_prompt: usize,

    /// Characters of evidence content included per item
    pub evidence_excerpt_chars: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            report_title: "Automaton Auditor Evaluation".to_string(),
            timeouts: Timeouts::default(),
            placeholder_evidence_on_failure: true,
            evidence_per_prompt: 10,
            evidence_excerpt_chars: 500,
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

mod humantime_duration_map {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;
    use std::time::Duration;

    pub fn serialize<S>(map: &BTreeMap<String, Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(
            map.iter()
                .map(|(k, v)| (k, humantime::format_duration(*v).to_string())),
        )
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(stage, text)| {
                humantime::parse_duration(&text)
                    .map(|d| (stage, d))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.report_title, "Automaton Auditor Evaluation");
        assert_eq!(config.timeouts.clone_class, Duration::from_secs(300));
        assert_eq!(config.timeouts.metadata_class, Duration::from_secs(30));
        assert!(config.placeholder_evidence_on_failure);
        assert_eq!(config.evidence_per_prompt, 10);
        assert_eq!(config.evidence_excerpt_chars, 500);
    }

    #[test]
    fn test_from_yaml_with_overrides() {
        let yaml = r#"
report_title: "Week 2 Audit"
timeouts:
  clone_class: "2m"
  per_stage:
    document_collector: "45s"
placeholder_evidence_on_failure: false
"#;
        let config = RuntimeConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.report_title, "Week 2 Audit");
        assert_eq!(config.timeouts.clone_class, Duration::from_secs(120));
        // Unset fields keep their defaults
        assert_eq!(config.timeouts.metadata_class, Duration::from_secs(30));
        assert_eq!(config.evidence_per_prompt, 10);
        assert!(!config.placeholder_evidence_on_failure);
        assert_eq!(
            config.timeouts.per_stage.get("document_collector"),
            Some(&Duration::from_secs(45))
        );
    }

    #[test]
    fn test_from_json() {
        let config = RuntimeConfig::from_json(r#"{"timeouts": {"evaluator": "5s"}}"#).unwrap();
        assert_eq!(config.timeouts.evaluator, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let result = RuntimeConfig::from_yaml("timeouts:\n  clone_class: \"soon\"\n");
        assert!(matches!(result, Err(ConfigError::YamlError(_))));
    }

    #[test]
    fn test_stage_timeout_resolution() {
        let mut timeouts = Timeouts::default();
        timeouts
            .per_stage
            .insert("repository_collector".to_string(), Duration::from_secs(10));

        assert_eq!(
            timeouts.for_stage("repository_collector", Some(TimeoutClass::Clone)),
            Some(Duration::from_secs(10))
        );
        assert_eq!(
            timeouts.for_stage("document_collector", Some(TimeoutClass::MetadataFetch)),
            Some(Duration::from_secs(30))
        );
        assert_eq!(timeouts.for_stage("synthesis", None), None);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = RuntimeConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("5m"));
        assert_eq!(RuntimeConfig::from_yaml(&yaml).unwrap(), config);
    }
}
