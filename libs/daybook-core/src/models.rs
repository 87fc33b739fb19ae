//! Data models for Daybook entities

use crate::error::{DaybookError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How an event repeats after its anchor date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepeatRule {
    #[serde(rename = "DAILY")]
    Daily,
    #[serde(rename = "WEEKLY")]
    Weekly,
    #[serde(rename = "MONTHLY")]
    Monthly,
    #[serde(rename = "YEARLY")]
    Yearly,
}

impl RepeatRule {
    /// Every rule, in display order
    pub const ALL: [RepeatRule; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly];

    /// Stable textual encoding used for storage
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for RepeatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatRule {
    type Err = DaybookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|rule| rule.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DaybookError::invalid_input(format!("Unknown repeat rule: {s}")))
    }
}

/// Unit of a reminder offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "MINUTES")]
    Minutes,
    #[serde(rename = "HOURS")]
    Hours,
    #[serde(rename = "DAYS")]
    Days,
    #[serde(rename = "WEEKS")]
    Weeks,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 4] = [Self::Minutes, Self::Hours, Self::Days, Self::Weeks];

    /// Stable textual encoding used for storage
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minutes => "MINUTES",
            Self::Hours => "HOURS",
            Self::Days => "DAYS",
            Self::Weeks => "WEEKS",
        }
    }

    /// Duration of `amount` of this unit
    #[must_use]
    pub fn duration(&self, amount: u32) -> Duration {
        let amount = i64::from(amount);
        match self {
            Self::Minutes => Duration::minutes(amount),
            Self::Hours => Duration::hours(amount),
            Self::Days => Duration::days(amount),
            Self::Weeks => Duration::weeks(amount),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = DaybookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DaybookError::invalid_input(format!("Unknown time unit: {s}")))
    }
}

/// Checklist item owned by an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    /// Generated identifier
    pub id: Uuid,
    /// Owning event (0 until the event is saved)
    pub event_id: i64,
    pub title: String,
    pub is_done: bool,
    /// 0-based position within the parent's list
    pub position: u32,
}

impl SubTask {
    /// Create an unsaved, not-done sub-task with a fresh id
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: 0,
            title: title.into(),
            is_done: false,
            position: 0,
        }
    }
}

/// Notification scheduled some time before an event starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub event_id: i64,
    pub offset: u32,
    pub unit: TimeUnit,
}

impl Reminder {
    /// Create an unsaved reminder with a fresh id
    #[must_use]
    pub fn new(offset: u32, unit: TimeUnit) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: 0,
            offset,
            unit,
        }
    }

    /// How long before the event start the reminder fires
    #[must_use]
    pub fn lead_time(&self) -> Duration {
        self.unit.duration(self.offset)
    }

    /// Local wall-clock instant at which the reminder fires for `event`
    #[must_use]
    pub fn fire_at(&self, event: &Event) -> Option<NaiveDateTime> {
        self.fire_before(event.starts_at())
    }

    /// Instant the reminder fires for an occurrence starting at `start`
    ///
    /// `None` when the lead time reaches past the representable range.
    #[must_use]
    pub fn fire_before(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        start.checked_sub_signed(self.lead_time())
    }
}

/// Calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Storage id, 0 while unsaved
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Anchor date; recurrence is computed from it
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub repeat: Option<RepeatRule>,
    pub sub_tasks: Vec<SubTask>,
    pub reminders: Vec<Reminder>,
    pub is_done: bool,
}

impl Event {
    /// Create an unsaved, untimed event on `date`
    #[must_use]
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            date,
            time: None,
            end_date: None,
            end_time: None,
            repeat: None,
            sub_tasks: Vec::new(),
            reminders: Vec::new(),
            is_done: false,
        }
    }

    /// Whether the event has been persisted
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.id > 0
    }

    /// Effective start: anchor date at the start time, or midnight when untimed
    #[must_use]
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    /// Check the end date is not before the anchor date
    ///
    /// # Errors
    /// Returns `DaybookError::Validation` if `end_date < date`
    pub fn validate_dates(&self) -> Result<()> {
        match self.end_date {
            Some(end) if end < self.date => Err(DaybookError::validation(format!(
                "End date {end} cannot be before start date {}",
                self.date
            ))),
            _ => Ok(()),
        }
    }

    /// Ordering used by date-scoped listings: open first, then by start time
    #[must_use]
    pub fn listing_key(&self) -> (bool, Option<NaiveTime>, i64) {
        (self.is_done, self.time, self.id)
    }

    /// Rewrite sub-task positions to match their order in the list
    pub fn renumber_sub_tasks(&mut self) {
        renumber(&mut self.sub_tasks);
    }
}

/// Rewrite `position` of every sub-task to its index
pub fn renumber(sub_tasks: &mut [SubTask]) {
    for (index, sub_task) in sub_tasks.iter_mut().enumerate() {
        sub_task.position = u32::try_from(index).unwrap_or(u32::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_repeat_rule_round_trips_through_text() {
        for rule in RepeatRule::ALL {
            assert_eq!(rule.as_str().parse::<RepeatRule>().unwrap(), rule);
        }
        assert_eq!("weekly".parse::<RepeatRule>().unwrap(), RepeatRule::Weekly);
    }

    #[test]
    fn test_repeat_rule_rejects_unknown_text() {
        let err = "FORTNIGHTLY".parse::<RepeatRule>().unwrap_err();
        assert!(matches!(err, DaybookError::InvalidInput { .. }));
    }

    #[test]
    fn test_repeat_rule_serde_uses_storage_names() {
        let json = serde_json::to_string(&RepeatRule::Monthly).unwrap();
        assert_eq!(json, "\"MONTHLY\"");
    }

    #[test]
    fn test_time_unit_parsing() {
        assert_eq!("hours".parse::<TimeUnit>().unwrap(), TimeUnit::Hours);
        assert!("fortnights".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_time_unit_duration() {
        assert_eq!(TimeUnit::Minutes.duration(15), Duration::minutes(15));
        assert_eq!(TimeUnit::Weeks.duration(2), Duration::days(14));
    }

    #[test]
    fn test_new_event_is_unsaved() {
        let event = Event::new("Dentist", date(2024, 3, 1));
        assert!(!event.is_saved());
        assert_eq!(event.starts_at(), date(2024, 3, 1).and_time(NaiveTime::MIN));
    }

    #[test]
    fn test_validate_dates() {
        let mut event = Event::new("Trip", date(2024, 3, 10));
        assert!(event.validate_dates().is_ok());

        event.end_date = Some(date(2024, 3, 10));
        assert!(event.validate_dates().is_ok());

        event.end_date = Some(date(2024, 3, 9));
        assert!(matches!(
            event.validate_dates(),
            Err(DaybookError::Validation { .. })
        ));
    }

    #[test]
    fn test_reminder_fire_at_timed_event() {
        let mut event = Event::new("Standup", date(2024, 3, 11));
        event.time = NaiveTime::from_hms_opt(9, 0, 0);
        let reminder = Reminder::new(15, TimeUnit::Minutes);
        assert_eq!(
            reminder.fire_at(&event),
            date(2024, 3, 11).and_hms_opt(8, 45, 0)
        );
    }

    #[test]
    fn test_reminder_fire_at_untimed_event_counts_from_midnight() {
        let event = Event::new("Birthday", date(2024, 3, 11));
        let reminder = Reminder::new(1, TimeUnit::Days);
        assert_eq!(
            reminder.fire_at(&event),
            date(2024, 3, 10).and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn test_reminder_fire_at_out_of_range() {
        let event = Event::new("x", date(2024, 1, 1));
        let reminder = Reminder::new(100_000_000, TimeUnit::Days);
        assert_eq!(reminder.fire_at(&event), None);
        assert_eq!(Reminder::new(u32::MAX, TimeUnit::Weeks).fire_at(&event), None);
    }

    #[test]
    fn test_renumber_sub_tasks() {
        let mut event = Event::new("Move house", date(2024, 5, 1));
        event.sub_tasks = vec![SubTask::new("Pack"), SubTask::new("Clean")];
        event.sub_tasks[0].position = 7;
        event.renumber_sub_tasks();
        let positions: Vec<u32> = event.sub_tasks.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn test_listing_key_orders_open_untimed_first() {
        let mut open_untimed = Event::new("a", date(2024, 1, 1));
        open_untimed.id = 3;
        let mut open_timed = Event::new("b", date(2024, 1, 1));
        open_timed.id = 1;
        open_timed.time = NaiveTime::from_hms_opt(8, 0, 0);
        let mut done = Event::new("c", date(2024, 1, 1));
        done.id = 2;
        done.is_done = true;

        let mut events = [done.clone(), open_timed.clone(), open_untimed.clone()];
        events.sort_by_key(Event::listing_key);
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
