//! Small text helpers shared by plan and workbook generation

use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback when no sentence can be extracted
pub const SUMMARY_FALLBACK: &str = "Summary not available.";

static MODULE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^module\s+\d+:\s*").expect("module prefix pattern"));

/// First `count` whitespace-separated words, joined by single spaces
#[must_use]
pub fn first_words(text: &str, count: usize) -> String {
    text.split_whitespace()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty sentence terminated by `.`, `!` or `?`, re-terminated with `.`
#[must_use]
pub fn first_sentence(text: &str) -> String {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .find(|sentence| !sentence.is_empty())
        .map(|sentence| format!("{sentence}."))
        .unwrap_or_else(|| SUMMARY_FALLBACK.to_string())
}

/// Drop a leading `Module N:` label so headings can re-number by position
#[must_use]
pub fn strip_module_prefix(title: &str) -> &str {
    match MODULE_PREFIX.find(title) {
        Some(found) => &title[found.end()..],
        None => title,
    }
}
