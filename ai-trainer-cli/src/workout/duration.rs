use regex::Regex;
use std::sync::OnceLock;

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").unwrap())
}

// Unit tokens must not be glued to a preceding letter: "45s" and "45 sec"
// match, the "s" in "reps" does not.
fn minute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(?:^|[^a-z])(?:mins?|minutes?)(?:[^a-z]|$)").unwrap())
}

fn second_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^a-z])(?:s|secs?|seconds?)(?:[^a-z]|$)").unwrap()
    })
}

/// Extract a duration in seconds from a rep scheme such as "30-60 sec" or "2 min".
///
/// Ranges resolve to their upper bound. Returns `None` for rep-based schemes
/// ("8-12") and for text without numbers.
pub fn parse_duration(text: &str) -> Option<u32> {
    let max = integer_pattern()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .max()?;

    if minute_pattern().is_match(text) {
        Some(max.saturating_mul(60))
    } else if second_pattern().is_match(text) {
        Some(max)
    } else {
        None
    }
}

/// Whether a rep scheme describes a timed movement
pub fn is_timed(text: &str) -> bool {
    parse_duration(text).is_some()
}
