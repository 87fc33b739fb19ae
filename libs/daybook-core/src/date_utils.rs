//! Date and time conversion utilities
//!
//! Events are anchored on calendar dates, while the outside world (pickers,
//! construction parameters) hands us epoch milliseconds. These helpers convert
//! between the two in an explicit time zone, normalize timestamps to local
//! midnight, and format values for display.

use crate::error::{DaybookError, Result};
use chrono::{DateTime, Local, Locale, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Display patterns used across the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePattern {
    /// `17 Oct 2026`
    StandardDate,
    /// `17 Oct`
    ShortDate,
    /// `Saturday, October 17`
    TitleDate,
    /// `09:30`
    StandardTime,
}

impl DatePattern {
    /// strftime-style format string for this pattern
    #[must_use]
    pub fn as_format(&self) -> &'static str {
        match self {
            Self::StandardDate => "%d %b %Y",
            Self::ShortDate => "%d %b",
            Self::TitleDate => "%A, %B %-d",
            Self::StandardTime => "%H:%M",
        }
    }
}

/// Convert epoch milliseconds to a zoned date-time
///
/// # Errors
/// Returns `DaybookError::InvalidInput` if the timestamp is out of range
pub fn millis_to_datetime<Tz: TimeZone>(millis: i64, tz: &Tz) -> Result<DateTime<Tz>> {
    tz.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| DaybookError::invalid_input(format!("Timestamp out of range: {millis}")))
}

/// Calendar date containing `millis` in `tz`
///
/// # Errors
/// Returns `DaybookError::InvalidInput` if the timestamp is out of range
pub fn millis_to_date<Tz: TimeZone>(millis: i64, tz: &Tz) -> Result<NaiveDate> {
    Ok(millis_to_datetime(millis, tz)?.date_naive())
}

/// Epoch milliseconds of the first instant of `date` in `tz`
///
/// Usually local midnight; when midnight falls into a DST gap the first
/// valid hour of the day is used instead.
///
/// # Errors
/// Returns `DaybookError::InvalidInput` if no instant of the day is representable
pub fn date_to_millis<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<i64> {
    (0..24)
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|start| start.timestamp_millis())
        .ok_or_else(|| DaybookError::invalid_input(format!("No valid start of day for {date}")))
}

/// Truncate a timestamp to the start of its local calendar day
///
/// Idempotent: normalizing an already normalized value returns it unchanged.
///
/// # Errors
/// Returns `DaybookError::InvalidInput` if the timestamp is out of range
pub fn normalize_to_midnight<Tz: TimeZone>(millis: i64, tz: &Tz) -> Result<i64> {
    date_to_millis(millis_to_date(millis, tz)?, tz)
}

/// Whether two timestamps fall on the same local calendar day
///
/// # Errors
/// Returns `DaybookError::InvalidInput` if either timestamp is out of range
pub fn is_same_day<Tz: TimeZone>(a: i64, b: i64, tz: &Tz) -> Result<bool> {
    Ok(millis_to_date(a, tz)? == millis_to_date(b, tz)?)
}

/// Format a timestamp with one of the display patterns
///
/// # Errors
/// Returns `DaybookError::InvalidInput` if the timestamp is out of range
pub fn format<Tz>(millis: i64, pattern: DatePattern, tz: &Tz, locale: Locale) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let datetime = millis_to_datetime(millis, tz)?;
    Ok(datetime
        .format_localized(pattern.as_format(), locale)
        .to_string())
}

/// Format a calendar date with one of the display patterns
#[must_use]
pub fn format_date(date: NaiveDate, pattern: DatePattern, locale: Locale) -> String {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
        .format_localized(pattern.as_format(), locale)
        .to_string()
}

/// Format a wall-clock time with [`DatePattern::StandardTime`]
#[must_use]
pub fn format_time(time: NaiveTime) -> String {
    time.format(DatePattern::StandardTime.as_format()).to_string()
}

/// Today's date in the local time zone
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// [`normalize_to_midnight`] in the local time zone
///
/// # Errors
/// Returns `DaybookError::InvalidInput` if the timestamp is out of range
pub fn normalize_to_local_midnight(millis: i64) -> Result<i64> {
    normalize_to_midnight(millis, &Local)
}

/// [`millis_to_date`] in the local time zone
///
/// # Errors
/// Returns `DaybookError::InvalidInput` if the timestamp is out of range
pub fn local_date_from_millis(millis: i64) -> Result<NaiveDate> {
    millis_to_date(millis, &Local)
}
