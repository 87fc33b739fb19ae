//! Daybook Core - events, recurrence, storage and editing state for the Daybook calendar
//!
//! This library holds everything behind the calendar screens: the event model,
//! the recurrence rules deciding which events show up on a day, an SQLite event
//! store with live queries, and the state machines driving the add/edit form
//! and the day pager.
//!
//! # Quick Start
//!
//! ```no_run
//! use daybook_core::{observe_events_for_date, DaybookError, Event, EventRepository, SqliteEventStore};
//! use chrono::NaiveDate;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), DaybookError> {
//! let store = Arc::new(SqliteEventStore::new(Path::new("/tmp/daybook.sqlite")).await?);
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
//! store.insert(&Event::new("Standup", date)).await?;
//!
//! let mut live = observe_events_for_date(store.clone(), date);
//! if let Some(Ok(events)) = live.next().await {
//!     println!("{} events on {date}", events.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `test-utils`: In-memory mock store and temporary databases for tests

pub mod calendar;
pub mod config;
pub mod database;
pub mod date_utils;
pub mod editor;
pub mod error;
pub mod live;
pub mod models;
pub mod observability;
pub mod preferences;
pub mod recurrence;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use calendar::{CalendarNavigator, CalendarState};
pub use config::DaybookConfig;
pub use database::{DatabasePoolConfig, SqliteEventStore};
pub use date_utils::DatePattern;
pub use editor::{
    validate_description, validate_title, AddEvent, AddEventEditor, DescriptionError, EditEvent,
    EditEventEditor, EditorAction, EditorMode, EditorPhase, EditorState, EventEditor,
    NavigationSignal, Picker, TitleError,
};
pub use error::{DaybookError, Result};
pub use live::LiveQuery;
pub use models::*;
pub use observability::init_tracing;
pub use preferences::{observe_bool, PreferenceStore, Settings, SqlitePreferenceStore};
pub use recurrence::{is_active_on, next_occurrence, occurs_on};
pub use repository::{observe_event_by_id, observe_events_for_date, EventRepository, StoreChange};

/// Re-export commonly used types
pub use chrono::{NaiveDate, NaiveTime};
pub use uuid::Uuid;
