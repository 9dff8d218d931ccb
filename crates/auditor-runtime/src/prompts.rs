//! Prompt material handed to evaluators.
//!
//! Prompts are layered:
//! 1. Base prompt shared by all personas
//! 2. Persona prompt with the persona's bias and scoring scale
//! 3. Criterion prompt with the evidence summary (built per call)

use auditor_core::{Criterion, Evidence, Persona};

/// Base system prompt shared by every persona.
pub const BASE_SYSTEM_PROMPT: &str = r#"
You are one of three evaluators auditing a software project.

You score exactly one criterion at a time, on a scale from 1 to 5.
You judge only the evidence you are given.
You do not see the other evaluators' scores.

## Output Format (JSON)
{
  "criterion_id": "string",
  "score": 1-5,
  "argument": "reasoning for the score",
  "cited_evidence": ["evidence ids"]
}
"#;

/// Critical persona: adversarial, looks for what is wrong.
pub const CRITICAL_PROMPT: &str = r#"
## Persona: Critical

Assume nothing works until the evidence shows it does.
Look for gaps, missing requirements and shortcuts.

Charges to look for:
- Linear flow presented as parallel orchestration
- Claims about files or features that do not exist
- Unsandboxed shell calls and other security negligence
- Untyped state where typed records are expected

Scoring:
- 1: fundamentally broken
- 2: major requirements missing
- 3: works with significant issues
- 4: mostly works, minor issues
- 5: only if truly exceptional

If you find a security issue, say "security" in your argument.
"#;

/// Charitable persona: rewards effort and intent.
pub const CHARITABLE_PROMPT: &str = r#"
## Persona: Charitable

Look for what is right, even when imperfect.
Credit intent, iteration visible in history, and creative workarounds.

Scoring:
- 1: no effort or understanding shown
- 2: an attempt, but fundamentally wrong
- 3: shows understanding, incomplete
- 4: mostly works, shows learning
- 5: goes beyond what was asked
"#;

/// Pragmatic persona: judges artifacts and breaks ties.
pub const PRAGMATIC_PROMPT: &str = r#"
## Persona: Pragmatic

Ignore effort and narrative. Judge the artifacts.
Ask whether it works, whether it is maintainable, and whether tool calls are isolated.
You are the tie-breaker between the other two personas.

Scoring:
- 1: does not work or cannot be maintained
- 2: works with serious technical debt
- 3: functional, meets the basics
- 4: well engineered, low debt
- 5: production ready
"#;

/// Get the persona prompt.
pub fn persona_prompt(persona: Persona) -> &'static str {
    match persona {
        Persona::Critical => CRITICAL_PROMPT,
        Persona::Charitable => CHARITABLE_PROMPT,
        Persona::Pragmatic => PRAGMATIC_PROMPT,
    }
}

/// Full system prompt for a persona: base prompt plus persona prompt.
pub fn system_prompt(persona: Persona) -> String {
    format!("{}{}", BASE_SYSTEM_PROMPT, persona_prompt(persona))
}

/// Summarize evidence for a prompt: the first `max_items` records, each
/// excerpted to `max_chars` characters.
pub fn evidence_summary(evidence: &[Evidence], max_items: usize, max_chars: usize) -> String {
    if evidence.is_empty() {
        return "No evidence collected for this criterion.".to_string();
    }

    evidence
        .iter()
        .take(max_items)
        .enumerate()
        .map(|(i, e)| {
            format!(
                "[{}] {} (confidence {:.2})\n    Source: {}\n    Content: {}",
                i + 1,
                e.id,
                e.confidence,
                e.source,
                e.excerpt(max_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Criterion prompt sent alongside the persona's system prompt.
pub fn evaluation_prompt(criterion: &Criterion, summary: &str) -> String {
    format!(
        "CRITERION TO EVALUATE:\n{}: {}\n\nEVIDENCE COLLECTED:\n{}\n\n\
         Evaluate this criterion using only the evidence above.\n\
         Respond with a score from 1-5, your argument, and the evidence ids you cite.",
        criterion.id, criterion.name, summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditor_core::{EvidenceBuilder, EvidenceCategory, Rubric};

    #[test]
    fn test_persona_prompt_retrieval() {
        for persona in Persona::ALL {
            let prompt = persona_prompt(persona);
            assert!(prompt.contains(&format!("## Persona: {}", persona.name())));
            assert!(prompt.contains("Scoring:"));
        }
    }

    #[test]
    fn test_system_prompt_layers() {
        let prompt = system_prompt(Persona::Pragmatic);
        assert!(prompt.starts_with(BASE_SYSTEM_PROMPT));
        assert!(prompt.ends_with(PRAGMATIC_PROMPT));
    }

    #[test]
    fn test_critical_prompt_names_security_keyword() {
        assert!(CRITICAL_PROMPT.contains("\"security\""));
    }

    #[test]
    fn test_base_prompt_output_format() {
        assert!(BASE_SYSTEM_PROMPT.contains("\"score\": 1-5"));
        assert!(BASE_SYSTEM_PROMPT.contains("cited_evidence"));
    }

    #[test]
    fn test_evidence_summary_bounds() {
        let evidence: Vec<Evidence> = (0..12)
            .map(|i| {
                EvidenceBuilder::new(EvidenceCategory::GitForensicAnalysis, "x".repeat(600))
                    .id(format!("git_{}", i))
                    .source("repo")
                    .build()
            })
            .collect();

        let summary = evidence_summary(&evidence, 10, 500);

        assert!(summary.contains("[10] git_9"));
        assert!(!summary.contains("git_10"));
        assert!(summary.contains(&format!("Content: {}...", "x".repeat(500))));
        assert!(!summary.contains(&"x".repeat(501)));
    }

    #[test]
    fn test_empty_evidence_summary() {
        assert_eq!(evidence_summary(&[], 10, 500), "No evidence collected for this criterion.");
    }

    #[test]
    fn test_evaluation_prompt_includes_criterion() {
        let rubric = Rubric::default();
        let criterion = &rubric.criteria[1];
        let prompt = evaluation_prompt(criterion, "[1] some evidence");

        assert!(prompt.contains("graph_orchestration: Graph Orchestration Architecture"));
        assert!(prompt.contains("[1] some evidence"));
    }
}
