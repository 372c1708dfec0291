use regex::Regex;
use std::sync::LazyLock;

/// Pattern for score-like words:
/// - Plain numbers: 287
/// - Numbers with comma grouping: 1,234 or 1,234,567
/// - An optional single decimal part: 2.91 or 1,204.5
const NUMERAL_PATTERN: &str = r"^(\d{1,3}(,\d{3})+|\d+)(\.\d+)?$";

static NUMERAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NUMERAL_PATTERN).expect("numeral pattern is valid"));

/// Returns the numeral with grouping separators removed if `text` (after trimming)
/// is a strict numeral, otherwise `None`.
pub fn clean_numeral(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if NUMERAL_REGEX.is_match(trimmed) {
        Some(trimmed.replace(',', ""))
    } else {
        None
    }
}

/// Parses loosely formatted score text (surrounding whitespace, commas) into a value.
/// Returns `None` for anything that is not a finite number.
pub fn parse_value(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
