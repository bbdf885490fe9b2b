//! Null-degrading scalar coercion.
//!
//! Source documents routinely use dashes and blanks to mean "no data", so
//! every parser here returns `None` for malformed input instead of erroring.

use std::sync::LazyLock;

use regex::Regex;

static TIME_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}(:\d{2})?$").expect("hardcoded time regex is valid"));

/// Collapses internal whitespace runs (including embedded line breaks from
/// wrapped PDF cells) to single spaces and trims the ends.
#[must_use]
pub fn clean_cell(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_null_token(token: &str) -> bool {
    matches!(token, "-" | "--")
        || token.is_empty()
        || matches!(
            token.to_ascii_lowercase().as_str(),
            "n/a" | "na" | "null" | "nan" | "none"
        )
}

/// Parses a cell as a number. Dashes, blanks, and the usual placeholder
/// spellings become `None`, as does anything that fails numeric conversion.
/// Time-of-day tokens (`18:45`) are never numbers.
#[must_use]
pub fn parse_number(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    if is_null_token(trimmed) || trimmed.contains(':') {
        return None;
    }
    trimmed.replace(',', "").parse::<f64>().ok()
}

/// Like [`parse_number`] but truncates to an integer, accepting values the
/// provider renders with a decimal point (`"2450.0"`).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_int(token: &str) -> Option<i64> {
    parse_number(token).map(|value| value.trunc() as i64)
}

/// Normalizes a label cell: embedded line breaks become spaces, and a cell
/// that is empty or a null placeholder becomes `None`.
#[must_use]
pub fn parse_label_string(token: &str) -> Option<String> {
    let cleaned = clean_cell(token);
    if is_null_token(&cleaned) {
        None
    } else {
        Some(cleaned)
    }
}

/// True when a cell plausibly holds an entity name (a station or state
/// label): it has letters and is not purely numeric/punctuation.
#[must_use]
pub fn looks_like_entity_text(cell: &str) -> bool {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return false;
    }
    let has_letter = trimmed.chars().any(|ch| ch.is_ascii_alphabetic());
    let only_numeric_shapes = trimmed
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '.' | ',' | ' '));
    has_letter && !only_numeric_shapes
}

/// True for time-of-day shaped tokens: `HH:MM` or a bare one/two digit hour.
#[must_use]
pub fn is_time_token(token: &str) -> bool {
    TIME_TOKEN.is_match(token.trim())
}
