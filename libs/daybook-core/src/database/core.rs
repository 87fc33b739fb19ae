use crate::{
    database::{
        mappers::{map_event_row, map_reminder_row, map_sub_task_row},
        schema::SCHEMA,
    },
    error::{DaybookError, Result},
    models::Event,
    preferences::SqlitePreferenceStore,
    recurrence::is_active_on,
    repository::{EventRepository, StoreChange},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqliteConnection, SqlitePool,
};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

const EVENT_COLUMNS: &str =
    "id, title, description, date, time, end_date, end_time, repeat, is_done";

/// Capacity of the change feed; slower subscribers see `Lagged` and re-query
const CHANGE_FEED_CAPACITY: usize = 256;

/// Database connection pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabasePoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Idle timeout for connections
    pub idle_timeout: Option<Duration>,
    /// Enable WAL mode for better read concurrency
    pub enable_wal_mode: bool,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            enable_wal_mode: true,
        }
    }
}

impl DatabasePoolConfig {
    /// Single long-lived connection, required for `sqlite::memory:`
    #[must_use]
    pub fn single_connection() -> Self {
        Self {
            max_connections: 1,
            min_connections: 1,
            idle_timeout: None,
            enable_wal_mode: false,
            ..Self::default()
        }
    }
}

/// SQLite-backed event store
///
/// Cloning is cheap; clones share the pool and the change feed.
#[derive(Debug, Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
    changes: broadcast::Sender<StoreChange>,
    preferences: Arc<SqlitePreferenceStore>,
}

impl SqliteEventStore {
    /// Open (creating if needed) the database at `database_path`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the connection fails,
    /// or the schema cannot be applied
    #[instrument]
    pub async fn new(database_path: &Path) -> Result<Self> {
        Self::new_with_config(database_path, DatabasePoolConfig::default()).await
    }

    /// Open the database at `database_path` with a custom pool configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the connection fails,
    /// or the schema cannot be applied
    #[instrument]
    pub async fn new_with_config(database_path: &Path, config: DatabasePoolConfig) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        info!("Opening SQLite database at: {}", database_path.display());
        let options = SqliteConnectOptions::new().filename(database_path);
        Self::connect(options, config).await
    }

    /// Open a database from a connection string such as `sqlite://daybook.db`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or the
    /// schema cannot be applied
    #[instrument]
    pub async fn from_connection_string(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| DaybookError::configuration(format!("Invalid database URL: {e}")))?;
        Self::connect(options, DatabasePoolConfig::default()).await
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DaybookError::configuration(format!("Invalid database URL: {e}")))?;
        Self::connect(options, DatabasePoolConfig::single_connection()).await
    }

    async fn connect(options: SqliteConnectOptions, config: DatabasePoolConfig) -> Result<Self> {
        let journal_mode = if config.enable_wal_mode {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };
        let options = options
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(journal_mode);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DaybookError::storage(format!("Failed to connect to database: {e}")))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| DaybookError::storage(format!("Failed to apply schema: {e}")))?;
        }

        info!(
            "Database ready with {} max connections",
            config.max_connections
        );

        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        let preferences = Arc::new(SqlitePreferenceStore::new(pool.clone()));
        Ok(Self {
            pool,
            changes,
            preferences,
        })
    }

    /// Get the underlying connection pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Preference store sharing this database
    #[must_use]
    pub fn preferences(&self) -> Arc<SqlitePreferenceStore> {
        Arc::clone(&self.preferences)
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn publish(&self, change: StoreChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }

    async fn load_children(&self, event: &mut Event) -> Result<()> {
        let sub_task_rows = sqlx::query(
            "SELECT id, event_id, title, is_done, position FROM sub_tasks WHERE event_id = ? ORDER BY position, rowid",
        )
        .bind(event.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to fetch sub-tasks: {e}")))?;
        event.sub_tasks = sub_task_rows
            .iter()
            .map(map_sub_task_row)
            .collect::<Result<Vec<_>>>()?;

        let reminder_rows = sqlx::query(
            "SELECT id, event_id, offset_value, unit FROM reminders WHERE event_id = ? ORDER BY rowid",
        )
        .bind(event.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to fetch reminders: {e}")))?;
        event.reminders = reminder_rows
            .iter()
            .map(map_reminder_row)
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>>>()?;

        Ok(())
    }

    async fn hydrate(&self, rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Event>> {
        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let mut event = map_event_row(row)?;
            self.load_children(&mut event).await?;
            events.push(event);
        }
        Ok(events)
    }
}

/// Write sub-tasks and reminders of `event` under `event_id`
async fn insert_children(conn: &mut SqliteConnection, event_id: i64, event: &Event) -> Result<()> {
    for (position, sub_task) in event.sub_tasks.iter().enumerate() {
        sqlx::query(
            "INSERT INTO sub_tasks (id, event_id, title, is_done, position) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(sub_task.id.to_string())
        .bind(event_id)
        .bind(&sub_task.title)
        .bind(sub_task.is_done)
        .bind(i64::try_from(position).unwrap_or(i64::MAX))
        .execute(&mut *conn)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to save sub-task: {e}")))?;
    }

    for reminder in &event.reminders {
        sqlx::query("INSERT INTO reminders (id, event_id, offset_value, unit) VALUES (?, ?, ?, ?)")
            .bind(reminder.id.to_string())
            .bind(event_id)
            .bind(i64::from(reminder.offset))
            .bind(reminder.unit.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|e| DaybookError::storage(format!("Failed to save reminder: {e}")))?;
    }

    Ok(())
}

async fn delete_children(conn: &mut SqliteConnection, event_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM sub_tasks WHERE event_id = ?")
        .bind(event_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to delete sub-tasks: {e}")))?;
    sqlx::query("DELETE FROM reminders WHERE event_id = ?")
        .bind(event_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to delete reminders: {e}")))?;
    Ok(())
}

#[async_trait]
impl EventRepository for SqliteEventStore {
    #[instrument(skip(self, event), fields(title = %event.title))]
    async fn insert(&self, event: &Event) -> Result<i64> {
        event.validate_dates()?;

        let mut tx = self.pool.begin().await?;
        let id = sqlx::query(
            r"
            INSERT INTO events (
                title, description, date, time, end_date, end_time, repeat, is_done
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.time)
        .bind(event.end_date)
        .bind(event.end_time)
        .bind(event.repeat.map(|rule| rule.as_str()))
        .bind(event.is_done)
        .execute(&mut *tx)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to create event: {e}")))?
        .last_insert_rowid();

        insert_children(&mut *tx, id, event).await?;
        tx.commit().await?;

        info!("Created event with id: {}", id);
        self.publish(StoreChange::EventInserted { id });
        Ok(id)
    }

    #[instrument(skip(self, event), fields(id = event.id))]
    async fn update(&self, event: &Event) -> Result<()> {
        event.validate_dates()?;

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            r"
            UPDATE events SET
                title = ?, description = ?, date = ?, time = ?,
                end_date = ?, end_time = ?, repeat = ?, is_done = ?
            WHERE id = ?
            ",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.time)
        .bind(event.end_date)
        .bind(event.end_time)
        .bind(event.repeat.map(|rule| rule.as_str()))
        .bind(event.is_done)
        .bind(event.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to update event: {e}")))?
        .rows_affected();

        if updated == 0 {
            return Err(DaybookError::EventNotFound { id: event.id });
        }

        delete_children(&mut *tx, event.id).await?;
        insert_children(&mut *tx, event.id, event).await?;
        tx.commit().await?;

        info!("Updated event with id: {}", event.id);
        self.publish(StoreChange::EventUpdated { id: event.id });
        Ok(())
    }

    #[instrument(skip(self, event), fields(id = event.id))]
    async fn delete(&self, event: &Event) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        delete_children(&mut *tx, event.id).await?;
        let deleted = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(event.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DaybookError::storage(format!("Failed to delete event: {e}")))?
            .rows_affected();

        if deleted == 0 {
            return Err(DaybookError::EventNotFound { id: event.id });
        }
        tx.commit().await?;

        info!("Deleted event with id: {}", event.id);
        self.publish(StoreChange::EventDeleted { id: event.id });
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_event(&self, id: i64) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DaybookError::storage(format!("Failed to fetch event: {e}")))?;

        match row {
            Some(row) => {
                let mut event = map_event_row(&row)?;
                self.load_children(&mut event).await?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn events_for_date(&self, date: NaiveDate) -> Result<Vec<Event>> {
        // Candidates: anchored on the day, spanning it, or repeating from before it.
        // Repeat rules are then checked in Rust.
        let rows = sqlx::query(&format!(
            r"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE date = ?
               OR (end_date IS NOT NULL AND date <= ? AND end_date >= ?)
               OR (repeat IS NOT NULL AND date < ?)
            "
        ))
        .bind(date)
        .bind(date)
        .bind(date)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to fetch events for {date}: {e}")))?;

        let mut events = self.hydrate(&rows).await?;
        events.retain(|event| is_active_on(event, date));
        events.sort_by_key(Event::listing_key);

        debug!("Fetched {} events for {}", events.len(), date);
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn all_events(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY date, time, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to fetch events: {e}")))?;

        let events = self.hydrate(&rows).await?;
        debug!("Fetched {} events", events.len());
        Ok(events)
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Reminder, RepeatRule, SubTask, TimeUnit};
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let mut event = Event::new("Planning", date(2024, 3, 4));
        event.description = "Quarterly planning".to_string();
        event.time = NaiveTime::from_hms_opt(10, 30, 0);
        event.repeat = Some(RepeatRule::Monthly);
        event.sub_tasks = vec![SubTask::new("Agenda"), SubTask::new("Room")];
        event.reminders = vec![Reminder::new(30, TimeUnit::Minutes)];

        let id = store.insert(&event).await.unwrap();
        assert!(id > 0);

        let loaded = store.get_event(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.title, "Planning");
        assert_eq!(loaded.description, "Quarterly planning");
        assert_eq!(loaded.time, event.time);
        assert_eq!(loaded.repeat, Some(RepeatRule::Monthly));
        let titles: Vec<&str> = loaded.sub_tasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Agenda", "Room"]);
        assert!(loaded.sub_tasks.iter().all(|s| s.event_id == id));
        assert_eq!(loaded.reminders.len(), 1);
        assert_eq!(loaded.reminders[0].unit, TimeUnit::Minutes);
    }

    #[tokio::test]
    async fn test_insert_rejects_end_before_start() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let mut event = Event::new("Backwards", date(2024, 3, 4));
        event.end_date = Some(date(2024, 3, 3));

        let result = store.insert(&event).await;
        assert!(matches!(result, Err(DaybookError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_update_missing_event_is_not_found() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let mut event = Event::new("Ghost", date(2024, 3, 4));
        event.id = 404;

        let result = store.update(&event).await;
        assert_eq!(result, Err(DaybookError::EventNotFound { id: 404 }));
    }

    #[tokio::test]
    async fn test_delete_cascades_children() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let mut event = Event::new("Groceries", date(2024, 3, 4));
        event.sub_tasks = vec![SubTask::new("Milk")];
        event.reminders = vec![Reminder::new(1, TimeUnit::Hours)];
        event.id = store.insert(&event).await.unwrap();

        store.delete(&event).await.unwrap();

        assert!(store.get_event(event.id).await.unwrap().is_none());
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sub_tasks")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_writes_are_announced() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let mut changes = store.changes();

        let mut event = Event::new("Announce", date(2024, 3, 4));
        event.id = store.insert(&event).await.unwrap();
        assert_eq!(
            changes.recv().await.unwrap(),
            StoreChange::EventInserted { id: event.id }
        );

        store.delete(&event).await.unwrap();
        assert_eq!(
            changes.recv().await.unwrap(),
            StoreChange::EventDeleted { id: event.id }
        );
    }
}
