//! Follow-up question extraction from free text.
//!
//! Providers are asked for a numbered list but may answer with bullets,
//! prose or nothing at all. Parsing never fails; odd input yields a shorter
//! (possibly empty) list.

use regex_lite::Regex;
use std::sync::LazyLock;

pub const MAX_FOLLOW_UPS: usize = 3;

/// Leading `1.` or `2)` ordinals or `-`, `*`, `•` bullets. A marker must be
/// followed by whitespace or end the line, so "3.5%" keeps its digits.
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+[.)]|[-*•])(?:\s+|$)").expect("valid list marker pattern")
});

/// Split `text` into at most three follow-up questions, in order.
pub fn parse_follow_ups(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .take(MAX_FOLLOW_UPS)
        .collect()
}
