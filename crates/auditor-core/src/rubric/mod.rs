//! Rubric: the criteria an audit scores and the static remediation table.
//!
//! A rubric is configuration data. The synthesizer only indexes it; it
//! never derives recommendations on its own.

mod defaults;
mod parser;

pub use parser::{Criterion, Rubric, RubricError};
