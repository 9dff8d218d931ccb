//! Audit orchestrator: assembles the fixed audit workflow and runs it.
//!
//! The orchestrator implements:
//! - Pre-flight validation of the target (the only fatal run-time error)
//! - Parallel fan-out to all collectors, then a full-join barrier
//! - Parallel fan-out to the three evaluator personas, then a barrier
//! - Deterministic fan-in through the Synthesizer

use std::sync::Arc;

use auditor_core::{AuditReport, Persona, Rubric, Synthesizer};

use crate::agents::{Collector, Evaluator};
use crate::config::RuntimeConfig;
use crate::engine::WorkflowEngine;
use crate::stages::{
    CollectorStage, ContextStage, EvaluatorStage, EvidenceAggregator, OpinionAggregator,
    SynthesisStage, CONTEXT, EVIDENCE_AGGREGATOR, OPINION_AGGREGATOR,
};
use crate::state::{AuditTarget, RunState, TraceEvent};
use crate::AuditError;

/// Runs audits over a fixed stage graph.
pub struct Auditor {
    engine: WorkflowEngine,
}

impl Auditor {
    pub fn builder() -> AuditorBuilder {
        AuditorBuilder::new()
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Run an audit and return the report.
    pub async fn run(&self, target: AuditTarget) -> Result<AuditReport, AuditError> {
        self.run_with_trace(target).await.map(|(report, _)| report)
    }

    /// Run an audit and return the report with the execution trace.
    pub async fn run_with_trace(
        &self,
        target: AuditTarget,
    ) -> Result<(AuditReport, Vec<TraceEvent>), AuditError> {
        let RunState { report, trace, .. } = self.run_state(target).await?;
        let report = report.ok_or(AuditError::MissingReport)?;
        Ok((report, trace))
    }

    /// Run an audit and return the final Run State.
    pub async fn run_state(&self, target: AuditTarget) -> Result<RunState, AuditError> {
        if target.is_empty() {
            tracing::warn!("No repository or document supplied, aborting before any stage runs");
            return Err(AuditError::Input);
        }

        tracing::info!(target = %target.reference(), stages = self.engine.graph().len(), "Starting audit");
        let state = self.engine.run(RunState::new(target)).await;

        tracing::info!(
            errors = state.errors.len(),
            opinions = state.opinions.len(),
            overall_score = ?state.report.as_ref().map(|r| r.overall_score),
            "Audit finished"
        );
        Ok(state)
    }
}

/// Builder for [`Auditor`].
pub struct AuditorBuilder {
    config: RuntimeConfig,
    rubric: Rubric,
    collectors: Vec<Arc<dyn Collector>>,
    evaluator: Option<Arc<dyn Evaluator>>,
}

impl AuditorBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            rubric: Rubric::default(),
            collectors: Vec::new(),
            evaluator: None,
        }
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the rubric.
    pub fn rubric(mut self, rubric: Rubric) -> Self {
        self.rubric = rubric;
        self
    }

    /// Add a collector. Collectors run concurrently.
    pub fn collector(mut self, collector: Arc<dyn Collector>) -> Self {
        self.collectors.push(collector);
        self
    }

    /// Set the evaluator shared by all personas.
    pub fn evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Build the auditor and its stage graph.
    pub fn build(self) -> Result<Auditor, AuditError> {
        let evaluator = self
            .evaluator
            .ok_or_else(|| AuditError::NotConfigured("No evaluator set".to_string()))?;
        self.rubric.validate()?;

        let rubric = Arc::new(self.rubric);
        let synthesizer = Arc::new(Synthesizer::new(rubric.as_ref().clone()));
        let mut engine = WorkflowEngine::new(self.config.clone());

        engine.register(Arc::new(ContextStage), &[])?;

        let mut collected: Vec<String> = vec![CONTEXT.to_string()];
        for collector in self.collectors {
            let id = collector.name().to_string();
            let stage = CollectorStage::new(collector, self.config.placeholder_evidence_on_failure);
            engine.register(Arc::new(stage), &[CONTEXT])?;
            collected.push(id);
        }
        engine.register(Arc::new(EvidenceAggregator), &as_strs(&collected))?;

        let mut evaluated = Vec::new();
        for persona in Persona::ALL {
            let stage = EvaluatorStage::new(persona, Arc::clone(&evaluator), Arc::clone(&rubric), &self.config);
            evaluated.push(EvaluatorStage::stage_id(persona));
            engine.register(Arc::new(stage), &[EVIDENCE_AGGREGATOR])?;
        }
        engine.register(Arc::new(OpinionAggregator), &as_strs(&evaluated))?;

        engine.register(
            Arc::new(SynthesisStage::new(synthesizer, self.config.report_title.clone())),
            &[OPINION_AGGREGATOR],
        )?;

        Ok(Auditor { engine })
    }
}

impl Default for AuditorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn as_strs(ids: &[String]) -> Vec<&str> {
    ids.iter().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use auditor_core::{Opinion, Score};

    use crate::agents::{Collected, EvaluationRequest};
    use crate::engine::GraphDefinitionError;
    use crate::state::InputKind;

    struct NamedCollector(&'static str);

    #[async_trait]
    impl Collector for NamedCollector {
        fn name(&self) -> &str {
            self.0
        }

        fn input(&self) -> InputKind {
            InputKind::Repository
        }

        async fn collect(&self, _reference: &str) -> Collected {
            Collected::ok(vec![])
        }
    }

    struct NeutralEvaluator;

    #[async_trait]
    impl Evaluator for NeutralEvaluator {
        async fn evaluate(&self, request: &EvaluationRequest) -> anyhow::Result<Opinion> {
            Ok(Opinion::scored(
                request.persona,
                request.criterion.id.clone(),
                Score::NEUTRAL,
                "neutral",
                vec![],
            ))
        }
    }

    fn builder() -> AuditorBuilder {
        Auditor::builder()
            .collector(Arc::new(NamedCollector("repository_collector")))
            .collector(Arc::new(NamedCollector("document_collector")))
            .evaluator(Arc::new(NeutralEvaluator))
    }

    #[test]
    fn test_graph_shape() {
        let auditor = builder().build().unwrap();
        assert_eq!(
            auditor.engine().graph().layers(),
            vec![
                vec!["context"],
                vec!["repository_collector", "document_collector"],
                vec!["evidence_aggregator"],
                vec!["evaluator_critical", "evaluator_charitable", "evaluator_pragmatic"],
                vec!["opinion_aggregator"],
                vec!["synthesis"],
            ]
        );
    }

    #[test]
    fn test_build_without_collectors() {
        let auditor = Auditor::builder().evaluator(Arc::new(NeutralEvaluator)).build().unwrap();
        assert_eq!(auditor.engine().graph().layers()[1], vec!["evidence_aggregator"]);
    }

    #[test]
    fn test_build_requires_evaluator() {
        let result = Auditor::builder().build();
        assert!(matches!(result, Err(AuditError::NotConfigured(_))));
    }

    #[test]
    fn test_duplicate_collector_rejected() {
        let result = builder()
            .collector(Arc::new(NamedCollector("repository_collector")))
            .build();
        assert!(matches!(
            result,
            Err(AuditError::GraphDefinition(GraphDefinitionError::DuplicateStage(_)))
        ));
    }

    #[test]
    fn test_invalid_rubric_rejected() {
        let mut rubric = Rubric::default();
        rubric.criteria.push(rubric.criteria[0].clone());
        let result = builder().rubric(rubric).build();
        assert!(matches!(result, Err(AuditError::Rubric(_))));
    }

    #[tokio::test]
    async fn test_empty_target_is_fatal() {
        let auditor = builder().build().unwrap();
        assert!(matches!(auditor.run(AuditTarget::default()).await, Err(AuditError::Input)));
        assert!(matches!(
            auditor.run_state(AuditTarget::repository("")).await,
            Err(AuditError::Input)
        ));
    }
}
