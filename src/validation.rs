// ABOUTME: Forgiving parsers for form input that turn malformed values into absence
// ABOUTME: A bad date or price clears the field instead of failing the request

use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date. Anything else, including blank input, is `None`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    // chrono accepts unpadded fields; require the exact 10-character shape.
    if text.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Parses a decimal price. Non-numeric or blank input is `None`.
pub fn parse_price(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Blank text fields are stored as absent.
pub fn parse_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
