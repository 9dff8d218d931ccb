//! Shared text patterns used during synthesis.
//!
//! Two patterns live here:
//! - the score marker (`Score 4/5`) that evaluators embed in a rationale
//! - the security keywords that trigger the security override when they
//!   appear in the Critical persona's rationale

use lazy_static::lazy_static;
use regex::Regex;

use crate::opinion::Score;

/// Keywords whose presence in a Critical rationale caps the final score.
pub const SECURITY_KEYWORDS: &[&str] = &["security", "vulnerability"];

lazy_static! {
    /// Score marker, e.g. "[CRITICAL] Score 4/5: ..."
    ///
    /// Captures any integer so that out-of-range markers are rejected
    /// by `Score::new` instead of silently matching a prefix.
    pub static ref SCORE_MARKER_PATTERN: Regex = Regex::new(
        r"(?i)\bscore\s+(\d+)\s*/\s*5\b"
    ).unwrap();

    /// Case-insensitive substring match against `SECURITY_KEYWORDS`.
    pub static ref SECURITY_PATTERN: Regex = Regex::new(
        &format!("(?i)(?:{})", SECURITY_KEYWORDS.join("|"))
    ).unwrap();
}

/// Extract the score from the first score marker in `text`.
///
/// Returns `None` when there is no marker or the marker holds a value
/// outside 1..=5.
pub fn parse_score_marker(text: &str) -> Option<Score> {
    let captures = SCORE_MARKER_PATTERN.captures(text)?;
    let value: u8 = captures.get(1)?.as_str().parse().ok()?;
    Score::new(value).ok()
}

/// Format the marker for a score, e.g. `Score 4/5`.
pub fn score_marker(score: Score) -> String {
    format!("Score {}/5", score.value())
}

/// Check if text mentions any security keyword.
pub fn mentions_security(text: &str) -> bool {
    SECURITY_PATTERN.is_match(text)
}
