//! Contracts for the external collaborators driven by the workflow.
//!
//! Collectors gather evidence about the target; evaluators turn evidence
//! into persona opinions. Neither is implemented here.

mod traits;

pub use traits::{Collected, Collector, EvaluationRequest, Evaluator};
