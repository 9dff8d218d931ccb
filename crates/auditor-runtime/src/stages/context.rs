//! Entry stage: records what is being audited.

use async_trait::async_trait;
use std::sync::Arc;

use crate::engine::Stage;
use crate::state::{Contribution, InputKind, RunState, StatusFlag};

use super::CONTEXT;

pub struct ContextStage;

#[async_trait]
impl Stage for ContextStage {
    fn id(&self) -> &str {
        CONTEXT
    }

    async fn run(&self, state: Arc<RunState>) -> anyhow::Result<Contribution> {
        let target = &state.target;
        let mut contribution = Contribution::new().trace(CONTEXT, "building context for collectors");

        for kind in [InputKind::Repository, InputKind::Document] {
            let message = match target.input(kind) {
                Some(reference) => format!("{} = {}", kind, reference),
                None => format!("{} not supplied", kind),
            };
            contribution = contribution.trace(CONTEXT, message);
        }

        Ok(contribution.flag(StatusFlag::ContextBuilt, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AuditTarget;

    #[tokio::test]
    async fn test_context_records_inputs() {
        let state = RunState::new(AuditTarget::repository("https://example.com/r.git"));
        let contribution = ContextStage.run(Arc::new(state)).await.unwrap();

        let trace: Vec<String> = contribution.trace.iter().map(ToString::to_string).collect();
        assert_eq!(
            trace,
            vec![
                "context: building context for collectors",
                "context: repository = https://example.com/r.git",
                "context: document not supplied",
            ]
        );
        assert_eq!(contribution.flags, vec![(StatusFlag::ContextBuilt, true)]);
    }
}
