//! Workflow engine: runs a stage graph over one Run State.
//!
//! # Execution
//! - Stages are grouped into layers (see [`StageGraph::layers`])
//! - Every stage of a layer runs as its own tokio task against the same snapshot
//! - The layer is a full join: the next layer starts only after every task
//!   has finished, failed, panicked, or timed out
//! - Contributions merge in registration order, so runs are reproducible
//!   regardless of which sibling finished first

mod graph;
mod stage;

pub use graph::{GraphDefinitionError, StageGraph};
pub use stage::{Stage, StageError};

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RuntimeConfig;
use crate::state::{Contribution, ErrorEntry, RunState};

/// Owns the stage graph and executes it.
pub struct WorkflowEngine {
    graph: StageGraph,
    stages: HashMap<String, Arc<dyn Stage>>,
    config: RuntimeConfig,
}

impl WorkflowEngine {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            graph: StageGraph::new(),
            stages: HashMap::new(),
            config,
        }
    }

    /// Register a stage after its upstream dependencies.
    pub fn register(
        &mut self,
        stage: Arc<dyn Stage>,
        upstream: &[&str],
    ) -> Result<(), GraphDefinitionError> {
        let id = stage.id().to_string();
        self.graph.register(&id, upstream)?;
        self.stages.insert(id, stage);
        Ok(())
    }

    /// Add an edge between two registered stages.
    pub fn add_dependency(&mut self, stage: &str, upstream: &str) -> Result<(), GraphDefinitionError> {
        self.graph.add_dependency(stage, upstream)
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Execute every stage and return the final state.
    pub async fn run(&self, mut state: RunState) -> RunState {
        for (depth, layer) in self.graph.layers().into_iter().enumerate() {
            let snapshot = Arc::new(state.clone());
            tracing::debug!(layer = depth, stages = ?layer, "Starting fan-out group");

            let tasks = layer.iter().filter_map(|id| self.stages.get(*id)).map(|stage| {
                let stage = Arc::clone(stage);
                let snapshot = Arc::clone(&snapshot);
                let timeout = self
                    .config
                    .timeouts
                    .for_stage(stage.id(), stage.timeout_class());
                async move {
                    let outcome = execute(Arc::clone(&stage), snapshot, timeout).await;
                    (stage, outcome)
                }
            });

            // Barrier: every sibling's outcome is in hand before merging.
            for (stage, outcome) in join_all(tasks).await {
                let contribution = match outcome {
                    Ok(contribution) => {
                        tracing::debug!(stage = %stage.id(), "Stage completed");
                        contribution
                    }
                    Err(e) => self.isolate(stage.as_ref(), e),
                };
                state.merge(contribution);
            }
        }
        state
    }

    /// Turn a stage failure into a contribution describing it.
    fn isolate(&self, stage: &dyn Stage, error: StageError) -> Contribution {
        tracing::warn!(stage = %stage.id(), error = %error, "Stage failed, continuing");

        let mut contribution = Contribution::new()
            .error(ErrorEntry::new(stage.id(), stage.error_kind(), error.to_string()))
            .trace(stage.id(), format!("failed: {}", error));

        if self.config.placeholder_evidence_on_failure {
            if let Some(placeholder) = stage.placeholder(&error) {
                contribution = contribution
                    .trace(stage.id(), "recorded placeholder evidence")
                    .evidence([placeholder]);
            }
        }
        contribution
    }
}

/// Run one stage on its own task, with an optional timeout.
async fn execute(
    stage: Arc<dyn Stage>,
    snapshot: Arc<RunState>,
    timeout: Option<Duration>,
) -> Result<Contribution, StageError> {
    let handle = tokio::spawn(async move {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, stage.run(snapshot)).await {
                Ok(result) => result.map_err(StageError::Failed),
                Err(_) => Err(StageError::Timeout(limit)),
            },
            None => stage.run(snapshot).await.map_err(StageError::Failed),
        }
    });

    match handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(StageError::from_panic(e.into_panic())),
        Err(e) => Err(StageError::Panicked(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use auditor_core::{Evidence, EvidenceCategory};

    use crate::config::TimeoutClass;
    use crate::state::{AuditTarget, ErrorKind, StatusFlag};

    enum Behavior {
        Emit(&'static str),
        Fail,
        Panic,
        Hang,
        CountEvidence,
    }

    struct TestStage {
        id: &'static str,
        behavior: Behavior,
    }

    fn stage(id: &'static str, behavior: Behavior) -> Arc<dyn Stage> {
        Arc::new(TestStage { id, behavior })
    }

    #[async_trait]
    impl Stage for TestStage {
        fn id(&self) -> &str {
            self.id
        }

        fn timeout_class(&self) -> Option<TimeoutClass> {
            Some(TimeoutClass::MetadataFetch)
        }

        fn error_kind(&self) -> ErrorKind {
            ErrorKind::Collection
        }

        fn placeholder(&self, error: &StageError) -> Option<Evidence> {
            Some(Evidence::placeholder(EvidenceCategory::General, self.id, error))
        }

        async fn run(&self, state: Arc<RunState>) -> anyhow::Result<Contribution> {
            match self.behavior {
                Behavior::Emit(content) => Ok(Contribution::new()
                    .evidence([Evidence::new(EvidenceCategory::General, content, self.id)])
                    .trace(self.id, "emitted")),
                Behavior::Fail => Err(anyhow::anyhow!("collector exploded")),
                Behavior::Panic => panic!("stage bug"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Contribution::new())
                }
                Behavior::CountEvidence => Ok(Contribution::new()
                    .trace(self.id, format!("saw {} evidence", state.evidence_count()))
                    .flag(StatusFlag::EvidenceAggregated, true)),
            }
        }
    }

    fn engine(config: RuntimeConfig, siblings: Vec<(&'static str, Behavior)>) -> WorkflowEngine {
        let mut engine = WorkflowEngine::new(config);
        let ids: Vec<&str> = siblings.iter().map(|(id, _)| *id).collect();
        for (id, behavior) in siblings {
            engine.register(stage(id, behavior), &[]).unwrap();
        }
        engine.register(stage("barrier", Behavior::CountEvidence), &ids).unwrap();
        engine
    }

    #[tokio::test]
    async fn test_siblings_all_visible_at_barrier() {
        let engine = engine(
            RuntimeConfig::default(),
            vec![("a", Behavior::Emit("from a")), ("b", Behavior::Emit("from b"))],
        );

        let state = engine.run(RunState::new(AuditTarget::repository("repo"))).await;

        let contents: Vec<&str> = state.evidence[&EvidenceCategory::General]
            .iter()
            .map(|e| e.content.as_str())
            .collect();
        assert_eq!(contents, vec!["from a", "from b"]);
        assert_eq!(state.trace.last().unwrap().to_string(), "barrier: saw 2 evidence");
        assert!(state.flag(StatusFlag::EvidenceAggregated));
        assert!(state.errors.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_isolated_with_placeholder() {
        let engine = engine(
            RuntimeConfig::default(),
            vec![("a", Behavior::Fail), ("b", Behavior::Emit("from b"))],
        );

        let state = engine.run(RunState::default()).await;

        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].stage, "a");
        assert_eq!(state.errors[0].kind, ErrorKind::Collection);
        assert!(state.errors[0].message.contains("collector exploded"));

        let general = &state.evidence[&EvidenceCategory::General];
        assert_eq!(general.len(), 2);
        assert!(general[0].is_placeholder());
        assert_eq!(general[1].content, "from b");
        assert_eq!(state.trace.last().unwrap().to_string(), "barrier: saw 2 evidence");
    }

    #[tokio::test]
    async fn test_panic_is_isolated_without_placeholder() {
        let config = RuntimeConfig {
            placeholder_evidence_on_failure: false,
            ..Default::default()
        };
        let engine = engine(config, vec![("a", Behavior::Panic), ("b", Behavior::Emit("ok"))]);

        let state = engine.run(RunState::default()).await;

        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].message, "panicked: stage bug");
        assert_eq!(state.evidence_count(), 1);
        assert!(state.flag(StatusFlag::EvidenceAggregated));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_isolated() {
        let engine = engine(
            RuntimeConfig::default(),
            vec![("a", Behavior::Emit("fast")), ("b", Behavior::Hang)],
        );

        let state = engine.run(RunState::default()).await;

        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].stage, "b");
        assert_eq!(state.errors[0].message, "timed out after 30s");
        assert!(state
            .trace
            .iter()
            .any(|t| t.to_string() == "b: failed: timed out after 30s"));
        assert!(state.flag(StatusFlag::EvidenceAggregated));
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_stage_timeout_override() {
        let mut config = RuntimeConfig::default();
        config.timeouts.per_stage.insert("b".to_string(), Duration::from_secs(2));
        let engine = engine(config, vec![("b", Behavior::Hang)]);

        let state = engine.run(RunState::default()).await;
        assert_eq!(state.errors[0].message, "timed out after 2s");
    }

    #[test]
    fn test_register_rejects_unknown_dependency() {
        let mut engine = WorkflowEngine::new(RuntimeConfig::default());
        let result = engine.register(stage("barrier", Behavior::CountEvidence), &["missing"]);
        assert!(matches!(result, Err(GraphDefinitionError::UnknownDependency { .. })));
        assert!(engine.graph().is_empty());
    }

    struct MeetingStage {
        id: &'static str,
        meeting: Arc<tokio::sync::Barrier>,
    }

    #[async_trait]
    impl Stage for MeetingStage {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, _state: Arc<RunState>) -> anyhow::Result<Contribution> {
            self.meeting.wait().await;
            Ok(Contribution::new().trace(self.id, "met"))
        }
    }

    #[tokio::test]
    async fn test_siblings_run_concurrently() {
        let meeting = Arc::new(tokio::sync::Barrier::new(2));
        let mut engine = WorkflowEngine::new(RuntimeConfig::default());
        for id in ["a", "b"] {
            let sibling = MeetingStage {
                id,
                meeting: Arc::clone(&meeting),
            };
            engine.register(Arc::new(sibling), &[]).unwrap();
        }

        let state = tokio::time::timeout(Duration::from_secs(5), engine.run(RunState::default()))
            .await
            .expect("siblings never met");

        let trace: Vec<String> = state.trace.iter().map(ToString::to_string).collect();
        assert_eq!(trace, vec!["a: met", "b: met"]);
        assert!(state.errors.is_empty());
    }

    #[test]
    fn test_add_dependency_rejects_cycle() {
        let mut engine = engine(RuntimeConfig::default(), vec![("a", Behavior::Emit("x"))]);
        engine.add_dependency("barrier", "a").unwrap();

        let result = engine.add_dependency("a", "barrier");
        assert!(matches!(result, Err(GraphDefinitionError::Cycle { .. })));
        assert_eq!(engine.graph().upstream("a"), Vec::<&str>::new());
    }
}
