//! Report-level aggregation: overall score, executive summary, remediation.

use crate::report::{CriterionResult, Grade, RemediationItem, RemediationPlan};
use crate::rubric::Rubric;

/// Mean criterion score, or 0.0 when nothing was scored.
pub fn overall_score(results: &[CriterionResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
}

/// Build the executive summary text.
pub fn executive_summary(results: &[CriterionResult], overall: f64, grade: Grade) -> String {
    if results.is_empty() {
        return "No evaluation results available.".to_string();
    }

    let passed = results.iter().filter(|r| r.passed).count();
    let mut lines = vec![
        format!("Overall grade: {}", grade),
        format!("Overall score: {:.2}/5", overall),
        format!("Criteria passed: {}/{}", passed, results.len()),
    ];

    let notable: Vec<String> = results
        .iter()
        .filter_map(|r| {
            if r.score >= 4.0 {
                Some(format!("- {}: strong performance ({}/5)", r.criterion, r.score))
            } else if r.score <= 2.0 {
                Some(format!("- {}: needs improvement ({}/5)", r.criterion, r.score))
            } else {
                None
            }
        })
        .collect();

    if !notable.is_empty() {
        lines.push("Key findings:".to_string());
        lines.extend(notable);
    }

    lines.join("\n")
}

/// Collect the rubric's recommendations for every failed criterion.
pub fn remediation_plan(results: &[CriterionResult], rubric: &Rubric) -> RemediationPlan {
    let items: Vec<RemediationItem> = results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| RemediationItem {
            criterion: r.criterion.clone(),
            current_score: r.score,
            recommendations: rubric.recommendations_for(&r.criterion).to_vec(),
        })
        .collect();

    if items.is_empty() {
        RemediationPlan::no_action()
    } else {
        RemediationPlan { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opinion::CriterionId;

    fn result(id: &str, score: f64) -> CriterionResult {
        CriterionResult {
            criterion: CriterionId::new(id),
            passed: score >= 3.0,
            score,
            findings: vec![],
            evidence_refs: vec![],
            dissent: None,
        }
    }

    #[test]
    fn test_overall_score() {
        assert_eq!(overall_score(&[]), 0.0);
        assert_eq!(overall_score(&[result("a", 4.0), result("b", 2.0)]), 3.0);
    }

    #[test]
    fn test_summary_lists_notable_findings() {
        let results = vec![result("graph_orchestration", 5.0), result("report_accuracy", 2.0), result("theoretical_depth", 3.0)];
        let overall = overall_score(&results);
        let summary = executive_summary(&results, overall, Grade::from_score(overall));

        assert!(summary.contains("Overall grade: DEVELOPING ENGINEER"));
        assert!(summary.contains("Overall score: 3.33/5"));
        assert!(summary.contains("Criteria passed: 2/3"));
        assert!(summary.contains("graph_orchestration: strong performance"));
        assert!(summary.contains("report_accuracy: needs improvement"));
        assert!(!summary.contains("theoretical_depth"));
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(
            executive_summary(&[], 0.0, Grade::VibeCoding),
            "No evaluation results available."
        );
    }

    #[test]
    fn test_remediation_only_for_failures() {
        let rubric = Rubric::default();
        let plan = remediation_plan(&[result("graph_orchestration", 2.0), result("report_accuracy", 4.0)], &rubric);

        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].criterion.as_str(), "graph_orchestration");
        assert_eq!(
            plan.items[0].recommendations,
            rubric.recommendations_for(&CriterionId::new("graph_orchestration"))
        );
    }

    #[test]
    fn test_remediation_no_action_when_all_pass() {
        let plan = remediation_plan(&[result("graph_orchestration", 4.0)], &Rubric::default());
        assert!(plan.is_no_action());
    }

    #[test]
    fn test_remediation_unknown_criterion_uses_defaults() {
        let rubric = Rubric::default();
        let plan = remediation_plan(&[result("swarm_visual", 1.0)], &rubric);
        assert_eq!(plan.items[0].recommendations, rubric.default_recommendations);
    }
}
