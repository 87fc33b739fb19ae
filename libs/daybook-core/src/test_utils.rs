//! Test utilities and mock data for the Daybook core

use crate::{
    database::SqliteEventStore,
    error::{DaybookError, Result},
    models::{Event, Reminder, RepeatRule, SubTask, TimeUnit},
    recurrence::is_active_on,
    repository::{EventRepository, StoreChange},
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;
use tokio::sync::broadcast;

/// Open an empty store in a fresh temporary directory
///
/// Keep the returned directory alive for as long as the store is used.
///
/// # Errors
/// Returns an error if the directory or database cannot be created
pub async fn create_test_store() -> Result<(SqliteEventStore, TempDir)> {
    let dir = TempDir::new()?;
    let store = SqliteEventStore::new(&dir.path().join("daybook-test.sqlite")).await?;
    Ok((store, dir))
}

/// A small, varied set of unsaved events around `date`
#[must_use]
pub fn create_mock_events(date: NaiveDate) -> Vec<Event> {
    let mut standup = Event::new("Standup", date);
    standup.time = NaiveTime::from_hms_opt(9, 30, 0);
    standup.repeat = Some(RepeatRule::Daily);
    standup.reminders = vec![Reminder::new(10, TimeUnit::Minutes)];

    let mut review = Event::new("Sprint review", date);
    review.description = "Demo the finished stories".to_string();
    review.time = NaiveTime::from_hms_opt(15, 0, 0);
    review.sub_tasks = vec![SubTask::new("Prepare slides"), SubTask::new("Book room")];
    review.renumber_sub_tasks();

    let mut trip = Event::new("Conference", date);
    trip.end_date = date.succ_opt();
    trip.reminders = vec![Reminder::new(1, TimeUnit::Days)];

    vec![standup, review, trip]
}

#[derive(Debug, Default)]
struct MockState {
    events: BTreeMap<i64, Event>,
    next_id: i64,
    inserted: Vec<Event>,
    updated: Vec<Event>,
    deleted: Vec<i64>,
}

/// In-memory [`EventRepository`] that records every write request
#[derive(Debug)]
pub struct MockEventStore {
    state: Mutex<MockState>,
    fail_writes: AtomicBool,
    changes: broadcast::Sender<StoreChange>,
}

impl Default for MockEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEventStore {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(MockState {
                next_id: 1,
                ..MockState::default()
            }),
            fail_writes: AtomicBool::new(false),
            changes,
        }
    }

    /// Store pre-populated with `events`, ids assigned in order
    #[must_use]
    pub fn with_events(events: Vec<Event>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            for mut event in events {
                let id = state.next_id;
                state.next_id += 1;
                assign_id(&mut event, id);
                state.events.insert(id, event);
            }
        }
        store
    }

    /// Make every subsequent write fail with a storage error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Events passed to successful `insert` calls, as given
    #[must_use]
    pub fn inserted(&self) -> Vec<Event> {
        self.state.lock().inserted.clone()
    }

    /// Events passed to successful `update` calls
    #[must_use]
    pub fn updated(&self) -> Vec<Event> {
        self.state.lock().updated.clone()
    }

    /// Ids passed to successful `delete` calls
    #[must_use]
    pub fn deleted(&self) -> Vec<i64> {
        self.state.lock().deleted.clone()
    }

    /// Number of live subscribers to the change feed
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(DaybookError::storage("Simulated write failure"))
        } else {
            Ok(())
        }
    }
}

fn assign_id(event: &mut Event, id: i64) {
    event.id = id;
    for sub_task in &mut event.sub_tasks {
        sub_task.event_id = id;
    }
    for reminder in &mut event.reminders {
        reminder.event_id = id;
    }
}

#[async_trait]
impl EventRepository for MockEventStore {
    async fn insert(&self, event: &Event) -> Result<i64> {
        self.check_writable()?;
        event.validate_dates()?;

        let id = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.inserted.push(event.clone());
            let mut stored = event.clone();
            assign_id(&mut stored, id);
            state.events.insert(id, stored);
            id
        };
        let _ = self.changes.send(StoreChange::EventInserted { id });
        Ok(id)
    }

    async fn update(&self, event: &Event) -> Result<()> {
        self.check_writable()?;
        event.validate_dates()?;

        {
            let mut state = self.state.lock();
            if !state.events.contains_key(&event.id) {
                return Err(DaybookError::EventNotFound { id: event.id });
            }
            state.updated.push(event.clone());
            state.events.insert(event.id, event.clone());
        }
        let _ = self.changes.send(StoreChange::EventUpdated { id: event.id });
        Ok(())
    }

    async fn delete(&self, event: &Event) -> Result<()> {
        self.check_writable()?;

        {
            let mut state = self.state.lock();
            if state.events.remove(&event.id).is_none() {
                return Err(DaybookError::EventNotFound { id: event.id });
            }
            state.deleted.push(event.id);
        }
        let _ = self.changes.send(StoreChange::EventDeleted { id: event.id });
        Ok(())
    }

    async fn get_event(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.state.lock().events.get(&id).cloned())
    }

    async fn events_for_date(&self, date: NaiveDate) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .state
            .lock()
            .events
            .values()
            .filter(|event| is_active_on(event, date))
            .cloned()
            .collect();
        events.sort_by_key(Event::listing_key);
        Ok(events)
    }

    async fn all_events(&self) -> Result<Vec<Event>> {
        Ok(self.state.lock().events.values().cloned().collect())
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
