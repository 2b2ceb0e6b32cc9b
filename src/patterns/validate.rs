// src/patterns/validate.rs
// =============================================================================
// Validation and normalization of pattern tokens.
//
// Allowed characters: ASCII letters, digits and  - _ . / + * @
// Anything else (spaces, brackets, braces, '?', '!', '$', ...) is rejected
// with an error that names the offending token.
//
// '**' is only accepted as a whole path segment ("src/**/*.ts"). Glued to
// other characters ("src/**.ts") it is ambiguous and rejected.
//
// Rust concepts:
// - Lazy statics: compile a Regex once, on first use
// - Iterator chains: split, trim, filter, collect
// =============================================================================

use crate::error::{IngestError, IngestResult};
use once_cell::sync::Lazy;
use regex::Regex;

static ALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-_./+*@]+$").expect("valid regex"));

/// Validates one token and returns its normalized form.
pub fn validate_pattern(token: &str) -> IngestResult<String> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(IngestError::invalid_pattern(token, "pattern is empty"));
    }

    if !ALLOWED_RE.is_match(trimmed) {
        let bad = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || "-_./+*@".contains(*c)))
            .unwrap_or('?');
        return Err(IngestError::invalid_pattern(
            token,
            format!("character '{}' is not allowed", bad),
        ));
    }

    if trimmed
        .split('/')
        .any(|segment| segment.contains("**") && segment != "**")
    {
        return Err(IngestError::invalid_pattern(
            token,
            "'**' must be a whole path segment",
        ));
    }

    let normalized = normalize_pattern(trimmed);
    if normalized.is_empty() {
        return Err(IngestError::invalid_pattern(token, "pattern is empty"));
    }
    Ok(normalized)
}

// Leading slashes are dropped and a trailing slash becomes a wildcard,
// so "/dist/" and "dist/*" mean the same thing.
pub fn normalize_pattern(token: &str) -> String {
    let stripped = token.trim_start_matches('/');
    if stripped.ends_with('/') {
        format!("{}*", stripped)
    } else {
        stripped.to_string()
    }
}

/// Splits a free-form user string ("*.md, src/  docs/") into tokens.
pub fn parse_pattern_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
