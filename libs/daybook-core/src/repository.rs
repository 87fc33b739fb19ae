//! Event repository contract
//!
//! The editing and calendar components only talk to storage through
//! [`EventRepository`]. Every write is announced on the change feed so live
//! queries (see [`crate::live`]) can refresh.

use crate::error::Result;
use crate::live::{spawn_live_query, LiveQuery};
use crate::models::Event;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Notification published after a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change_type")]
pub enum StoreChange {
    EventInserted { id: i64 },
    EventUpdated { id: i64 },
    EventDeleted { id: i64 },
}

impl StoreChange {
    /// Id of the event the change concerns
    #[must_use]
    pub fn event_id(&self) -> i64 {
        match self {
            Self::EventInserted { id } | Self::EventUpdated { id } | Self::EventDeleted { id } => {
                *id
            }
        }
    }
}

/// Create/read/update/delete access to events and their owned records
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new event with its sub-tasks and reminders, returning the generated id
    ///
    /// The `id` field of `event` is ignored.
    async fn insert(&self, event: &Event) -> Result<i64>;

    /// Replace the stored record with the same id, including sub-tasks and reminders
    async fn update(&self, event: &Event) -> Result<()>;

    /// Delete the event and everything it owns
    async fn delete(&self, event: &Event) -> Result<()>;

    /// Load one event by id
    async fn get_event(&self, id: i64) -> Result<Option<Event>>;

    /// Events active on `date`, ordered open-first then by start time
    async fn events_for_date(&self, date: NaiveDate) -> Result<Vec<Event>>;

    /// Every stored event, ordered by anchor date
    async fn all_events(&self) -> Result<Vec<Event>>;

    /// Subscribe to the change feed
    fn changes(&self) -> broadcast::Receiver<StoreChange>;
}

/// Live list of events active on `date`
///
/// Emits the current list first, then a new list whenever a write changes it.
pub fn observe_events_for_date(
    store: Arc<dyn EventRepository>,
    date: NaiveDate,
) -> LiveQuery<Vec<Event>> {
    let changes = store.changes();
    spawn_live_query(changes, move || {
        let store = Arc::clone(&store);
        async move { store.events_for_date(date).await }
    })
}

/// Live view of a single event, `None` once it is deleted
pub fn observe_event_by_id(store: Arc<dyn EventRepository>, id: i64) -> LiveQuery<Option<Event>> {
    let changes = store.changes();
    spawn_live_query(changes, move || {
        let store = Arc::clone(&store);
        async move { store.get_event(id).await }
    })
}
