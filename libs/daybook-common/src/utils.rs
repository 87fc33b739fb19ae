//! Utility functions shared by the Daybook crates

use crate::constants::{DATABASE_FILENAME, DATA_DIR, DATE_FORMATS, TIME_FORMATS};
use chrono::{NaiveDate, NaiveTime};
use std::path::PathBuf;

/// Get the default Daybook database path
#[must_use]
pub fn get_default_database_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
    PathBuf::from(home).join(DATA_DIR).join(DATABASE_FILENAME)
}

/// Parse a date using the first matching entry of [`DATE_FORMATS`]
///
/// # Errors
/// Returns the error of the last format tried if none match
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    let trimmed = date_str.trim();
    DATE_FORMATS[1..].iter().fold(
        NaiveDate::parse_from_str(trimmed, DATE_FORMATS[0]),
        |parsed, format| parsed.or_else(|_| NaiveDate::parse_from_str(trimmed, format)),
    )
}

/// Parse a wall-clock time using the first matching entry of [`TIME_FORMATS`]
///
/// # Errors
/// Returns the error of the last format tried if none match
pub fn parse_time(time_str: &str) -> Result<NaiveTime, chrono::ParseError> {
    let trimmed = time_str.trim();
    TIME_FORMATS[1..].iter().fold(
        NaiveTime::parse_from_str(trimmed, TIME_FORMATS[0]),
        |parsed, format| parsed.or_else(|_| NaiveTime::parse_from_str(trimmed, format)),
    )
}

/// Number of characters (not bytes) in a string
#[must_use]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to at most `max_len` characters, ending with "..." when cut
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if char_len(s) <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
