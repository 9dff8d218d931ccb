//! The stage kinds of an audit workflow.
//!
//! `context -> {collectors} -> evidence_aggregator -> {evaluators}
//!  -> opinion_aggregator -> synthesis`

mod aggregate;
mod collector;
mod context;
mod evaluator;
mod synthesis;

pub use aggregate::{EvidenceAggregator, OpinionAggregator};
pub use collector::CollectorStage;
pub use context::ContextStage;
pub use evaluator::EvaluatorStage;
pub use synthesis::SynthesisStage;

pub const CONTEXT: &str = "context";
pub const EVIDENCE_AGGREGATOR: &str = "evidence_aggregator";
pub const OPINION_AGGREGATOR: &str = "opinion_aggregator";
pub const SYNTHESIS: &str = "synthesis";
