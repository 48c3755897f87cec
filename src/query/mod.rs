//! Search term handling
//!
//! Terms are compared case-insensitively and with collapsed whitespace,
//! both for cache keys and for quick scoring.

/// Lowercase a term and collapse runs of whitespace
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Distinct lowercase whitespace-separated tokens, in first-seen order
pub fn tokens(term: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in term.split_whitespace().map(|t| t.to_lowercase()) {
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}
