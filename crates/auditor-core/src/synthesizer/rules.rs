//! Conflict-resolution rules applied to one criterion's persona scores.
//!
//! Every function here is pure. Thresholds are part of the contract and
//! are not configurable.

use crate::opinion::{Persona, Score};

/// Score cap applied when the Critical persona flags a security issue.
pub const SECURITY_CAP: u8 = 3;

/// Pragmatic score at which the functionality-weight rule applies.
pub const FUNCTIONALITY_THRESHOLD: u8 = 4;

/// Population variance above which a dissent explanation is attached.
pub const DISSENT_VARIANCE_THRESHOLD: f64 = 2.0;

/// Minimum final score for a criterion to pass.
pub const PASS_SCORE: u8 = 3;

/// Fixed statement closing every dissent explanation.
pub const DISSENT_RESOLUTION: &str = "Resolution: the final score balances strict evaluation (Critical) \
against effort recognition (Charitable), with practical viability (Pragmatic) as the tie-breaker.";

/// Scores for one criterion, one slot per persona.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonaScores {
    slots: [Option<Score>; 3],
}

impl PersonaScores {
    /// Record a persona's score. The first score per persona wins.
    pub fn record(&mut self, persona: Persona, score: Score) -> bool {
        let slot = &mut self.slots[persona.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(score);
        true
    }

    /// Whether any persona supplied a valid score.
    pub fn any_valid(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    /// The persona's score, or the neutral default when it gave none.
    pub fn resolved(&self, persona: Persona) -> u8 {
        self.slots[persona.index()]
            .unwrap_or(Score::NEUTRAL)
            .value()
    }

    /// Valid (non-defaulted) scores in persona order.
    pub fn valid(&self) -> Vec<(Persona, u8)> {
        Persona::ALL
            .iter()
            .filter_map(|p| self.slots[p.index()].map(|s| (*p, s.value())))
            .collect()
    }
}

/// Baseline: the highest persona score.
pub fn baseline(scores: &PersonaScores) -> u8 {
    Persona::ALL
        .iter()
        .map(|p| scores.resolved(*p))
        .max()
        .unwrap_or(Score::NEUTRAL.value())
}

/// Rule of security: cap at `SECURITY_CAP` when a security issue was flagged.
pub fn security_override(score: u8, security_flagged: bool) -> u8 {
    if security_flagged {
        score.min(SECURITY_CAP)
    } else {
        score
    }
}

/// Rule of functionality: a high Pragmatic score above the baseline lifts
/// the final score by one, capped at 5.
///
/// The comparison is against the `max()` baseline, which already includes
/// the Pragmatic score, so `baseline < pragmatic` never holds and this rule
/// never changes the score. It is kept as written pending a product decision
/// on its intended effect.
pub fn functionality_weight(score: u8, baseline: u8, pragmatic: u8) -> u8 {
    if pragmatic >= FUNCTIONALITY_THRESHOLD && baseline < pragmatic {
        (score + 1).min(Score::MAX)
    } else {
        score
    }
}

/// Population variance (divide by n). Zero for an empty slice.
pub fn population_variance(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let n = scores.len() as f64;
    let mean = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / n;
    scores
        .iter()
        .map(|s| (f64::from(*s) - mean).powi(2))
        .sum::<f64>()
        / n
}

/// Whether the variance is strictly above the dissent threshold.
pub fn needs_dissent(variance: f64) -> bool {
    variance > DISSENT_VARIANCE_THRESHOLD
}

/// Explain a disagreement: who held the minimum and who held the maximum.
///
/// Ties go to the persona that comes first in `Persona::ALL`.
pub fn dissent_explanation(valid: &[(Persona, u8)], variance: f64) -> Option<String> {
    let (min_persona, min_score) = valid
        .iter()
        .fold(None, |acc: Option<(Persona, u8)>, &(p, s)| match acc {
            Some((_, best)) if best <= s => acc,
            _ => Some((p, s)),
        })?;
    let (max_persona, max_score) = valid
        .iter()
        .fold(None, |acc: Option<(Persona, u8)>, &(p, s)| match acc {
            Some((_, best)) if best >= s => acc,
            _ => Some((p, s)),
        })?;

    Some(format!(
        "Dissent detected (variance {:.2}, spread {}): {} held the minimum score {}/5; \
         {} held the maximum score {}/5. {}",
        variance,
        max_score - min_score,
        min_persona,
        min_score,
        max_persona,
        max_score,
        DISSENT_RESOLUTION
    ))
}
