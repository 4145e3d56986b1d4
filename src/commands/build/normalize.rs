use anyhow::{Context, Result};
use regex::Regex;

use super::source::FieldValue;

/// Canonical form of an employer name or job title: uppercase, without `.`
/// and `,`, trimmed. Anything that is not a text cell becomes empty.
pub(crate) fn normalize_text(value: Option<&FieldValue>) -> String {
    match value {
        Some(FieldValue::Text(text)) => normalize_str(text),
        _ => String::new(),
    }
}

pub(crate) fn normalize_str(text: &str) -> String {
    text.to_uppercase()
        .replace(['.', ','], "")
        .trim()
        .to_string()
}

/// Drops every literal `.00` from the code's string form, so
/// `15-1252.00` becomes the broad code `15-1252`.
pub(crate) fn normalize_code(value: &FieldValue) -> String {
    value.to_source_string().replace(".00", "")
}

pub(crate) fn year_pattern() -> Result<Regex> {
    Regex::new(r"(?i)FY(\d{4})").context("failed to compile fiscal year filename regex")
}

/// Fiscal year embedded in a disclosure filename (`..._FY2023_Q4.xlsx`), or 0.
pub(crate) fn extract_year(filename: &str, pattern: &Regex) -> u32 {
    pattern
        .captures(filename)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok())
        .unwrap_or(0)
}
