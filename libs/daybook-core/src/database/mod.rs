//! Database module - SQLite event store, schema and row mappers

mod core;
pub mod mappers;
pub mod schema;

pub use core::*;

pub use mappers::{map_event_row, map_reminder_row, map_sub_task_row};
