//! Row mapping utilities for converting database rows to domain models
//!
//! Enum columns are stored as text. Unknown repeat values fall back to "no
//! repeat" and unknown reminder units drop the reminder; both are logged so a
//! newer schema never makes older rows unreadable.

use crate::{
    error::{DaybookError, Result},
    models::{Event, Reminder, RepeatRule, SubTask, TimeUnit},
};
use chrono::{NaiveDate, NaiveTime};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

/// Decode a stored repeat rule, falling back to `None` for unknown text
pub fn parse_repeat(stored: Option<&str>) -> Option<RepeatRule> {
    let text = stored?;
    match text.parse::<RepeatRule>() {
        Ok(rule) => Some(rule),
        Err(_) => {
            warn!("Ignoring unknown repeat rule '{}' in storage", text);
            None
        }
    }
}

/// Decode a stored reminder unit, `None` for unknown text
pub fn parse_time_unit(stored: &str) -> Option<TimeUnit> {
    match stored.parse::<TimeUnit>() {
        Ok(unit) => Some(unit),
        Err(_) => {
            warn!("Skipping reminder with unknown time unit '{}'", stored);
            None
        }
    }
}

/// Parse a stored record id
///
/// # Errors
///
/// Returns `DaybookError::Storage` if the text is not a UUID
pub fn parse_record_id(stored: &str) -> Result<Uuid> {
    Uuid::parse_str(stored)
        .map_err(|e| DaybookError::storage(format!("Corrupt record id '{stored}': {e}")))
}

/// Map an `events` row to an [`Event`] without sub-tasks or reminders
///
/// # Errors
///
/// Returns an error if required columns are missing or cannot be decoded
pub fn map_event_row(row: &SqliteRow) -> Result<Event> {
    let repeat: Option<String> = row.try_get("repeat")?;
    let is_done: i64 = row.try_get("is_done")?;

    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        date: row.try_get::<NaiveDate, _>("date")?,
        time: row.try_get::<Option<NaiveTime>, _>("time")?,
        end_date: row.try_get::<Option<NaiveDate>, _>("end_date")?,
        end_time: row.try_get::<Option<NaiveTime>, _>("end_time")?,
        repeat: parse_repeat(repeat.as_deref()),
        sub_tasks: Vec::new(),
        reminders: Vec::new(),
        is_done: is_done != 0,
    })
}

/// Map a `sub_tasks` row to a [`SubTask`]
///
/// # Errors
///
/// Returns an error if required columns are missing or cannot be decoded
pub fn map_sub_task_row(row: &SqliteRow) -> Result<SubTask> {
    let id: String = row.try_get("id")?;
    let is_done: i64 = row.try_get("is_done")?;
    let position: i64 = row.try_get("position")?;

    Ok(SubTask {
        id: parse_record_id(&id)?,
        event_id: row.try_get("event_id")?,
        title: row.try_get("title")?,
        is_done: is_done != 0,
        position: stored_u32(position, "sub-task position"),
    })
}

/// Narrow a stored counter, logging and zeroing values outside `u32`
pub fn stored_u32(value: i64, column: &str) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| {
        warn!("Ignoring out-of-range {} {} in storage", column, value);
        0
    })
}

/// Map a `reminders` row, `None` when the unit is not recognized
///
/// # Errors
///
/// Returns an error if required columns are missing or cannot be decoded
pub fn map_reminder_row(row: &SqliteRow) -> Result<Option<Reminder>> {
    let unit: String = row.try_get("unit")?;
    let Some(unit) = parse_time_unit(&unit) else {
        return Ok(None);
    };
    let id: String = row.try_get("id")?;
    let offset: i64 = row.try_get("offset_value")?;

    Ok(Some(Reminder {
        id: parse_record_id(&id)?,
        event_id: row.try_get("event_id")?,
        offset: stored_u32(offset, "reminder offset"),
        unit,
    }))
}
