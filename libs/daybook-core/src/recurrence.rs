//! Recurrence evaluation
//!
//! Decides whether an event is active on a given calendar date, either
//! directly (anchor day or inside its date range) or through its repeat rule.
//!
//! Anchors whose day does not exist in a later month or year are skipped
//! rather than clamped: an event on the 31st does not occur in 30-day months,
//! and an event on February 29 only occurs in leap years.

use crate::models::{Event, RepeatRule};
use chrono::{Datelike, Duration, NaiveDate};

/// Longest span searched by [`next_occurrence`].
///
/// Eight years always contains a February 29 that a yearly leap-day anchor
/// can land on.
const MAX_SEARCH_DAYS: i64 = 8 * 366;

/// Whether `event` recurs onto `query`
///
/// Never true on or before the anchor date: the anchor day itself is matched
/// by the direct-date check in [`is_active_on`].
#[must_use]
pub fn occurs_on(event: &Event, query: NaiveDate) -> bool {
    match event.repeat {
        Some(rule) if query > event.date => rule_matches(rule, event.date, query),
        _ => false,
    }
}

fn rule_matches(rule: RepeatRule, anchor: NaiveDate, query: NaiveDate) -> bool {
    match rule {
        RepeatRule::Daily => true,
        RepeatRule::Weekly => query.weekday() == anchor.weekday(),
        RepeatRule::Monthly => query.day() == anchor.day(),
        RepeatRule::Yearly => query.month() == anchor.month() && query.day() == anchor.day(),
    }
}

/// Whether `event` is scheduled on `date` directly or spans it
#[must_use]
pub fn is_scheduled_on(event: &Event, date: NaiveDate) -> bool {
    match event.end_date {
        Some(end) => event.date <= date && date <= end,
        None => event.date == date,
    }
}

/// Whether `event` should be listed for `date`
#[must_use]
pub fn is_active_on(event: &Event, date: NaiveDate) -> bool {
    is_scheduled_on(event, date) || occurs_on(event, date)
}

/// First date strictly after `after` on which `event` is active
///
/// Returns `None` when the event has no later occurrence within the search
/// window (non-repeating events whose range has passed).
#[must_use]
pub fn next_occurrence(event: &Event, after: NaiveDate) -> Option<NaiveDate> {
    (1..=MAX_SEARCH_DAYS)
        .map_while(|offset| after.checked_add_signed(Duration::days(offset)))
        .find(|candidate| is_active_on(event, *candidate))
}

/// Active dates of `event` within `from..=to`
#[must_use]
pub fn occurrences_between(event: &Event, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|day| *day <= to)
        .filter(|day| is_active_on(event, *day))
        .collect()
}
