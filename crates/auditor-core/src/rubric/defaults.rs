//! Built-in rubric for auditing a multi-agent orchestration project.

use crate::evidence::EvidenceCategory;
use crate::opinion::CriterionId;

use super::{Criterion, Rubric};

fn criterion(
    id: &str,
    name: &str,
    evidence: &[EvidenceCategory],
    recommendations: &[&str],
) -> Criterion {
    Criterion {
        id: CriterionId::new(id),
        name: name.to_string(),
        evidence: evidence.to_vec(),
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
    }
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            name: "Automaton Auditor Rubric".to_string(),
            criteria: vec![
                criterion(
                    "git_forensic_analysis",
                    "Git Forensic Analysis",
                    &[EvidenceCategory::GitForensicAnalysis],
                    &[
                        "Ensure commit history shows iterative development, not a single init commit",
                        "Break the implementation into logical commits: setup, tools, graph",
                        "Write commit messages that describe the change",
                    ],
                ),
                criterion(
                    "graph_orchestration",
                    "Graph Orchestration Architecture",
                    &[EvidenceCategory::GraphOrchestration],
                    &[
                        "Run evidence collectors as a parallel fan-out",
                        "Add an evidence aggregation barrier before the evaluators",
                        "Run the evaluator personas in parallel",
                        "Route stage failures through explicit error handling",
                    ],
                ),
                criterion(
                    "state_management_rigor",
                    "State Management Rigor",
                    &[EvidenceCategory::StateManagementRigor],
                    &[
                        "Use typed records for evidence and opinions",
                        "Merge parallel contributions through explicit reducers",
                        "Make sure parallel stages cannot overwrite each other's state",
                    ],
                ),
                criterion(
                    "theoretical_depth",
                    "Theoretical Depth",
                    &[EvidenceCategory::TheoreticalDepth],
                    &[
                        "Explain dialectical synthesis with architectural detail",
                        "Describe how fan-in and fan-out are implemented in code",
                        "Connect metacognition to the system evaluating its own output",
                    ],
                ),
                criterion(
                    "report_accuracy",
                    "Report Accuracy",
                    &[EvidenceCategory::ReportAccuracy],
                    &[
                        "Verify every cited file path exists in the repository",
                        "Remove claims about features that are not implemented",
                        "Cross-reference report claims with the implementation",
                    ],
                ),
            ],
            default_recommendations: vec![
                "Review the rubric and make sure every requirement is addressed".to_string(),
                "Ask the reviewers for clarification on ambiguous requirements".to_string(),
            ],
        }
    }
}
