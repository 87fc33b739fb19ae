//! Persistent user preferences
//!
//! Preferences are boolean flags keyed by name. The only flag the application
//! reads today is [`CONFIRM_DELETE_KEY`], which controls whether deleting an
//! event asks for confirmation first.

use crate::{
    error::{DaybookError, Result},
    live::{spawn_live_query, LiveQuery},
};
use async_trait::async_trait;
use daybook_common::{CONFIRM_DELETE_DEFAULT, CONFIRM_DELETE_KEY};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Key/value flag storage with change notifications
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Read a flag, `default` when it has never been written
    async fn get_bool(&self, key: &str, default: bool) -> Result<bool>;

    /// Write a flag
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Subscribe to the keys of written flags
    fn changes(&self) -> broadcast::Receiver<String>;
}

/// Live value of one flag
///
/// Emits the current value first, then each time a write changes it.
pub fn observe_bool(
    store: Arc<dyn PreferenceStore>,
    key: impl Into<String>,
    default: bool,
) -> LiveQuery<bool> {
    let key = key.into();
    let changes = store.changes();
    spawn_live_query(changes, move || {
        let store = Arc::clone(&store);
        let key = key.clone();
        async move { store.get_bool(&key, default).await }
    })
}

/// Preference store living in the `preferences` table of the event database
#[derive(Debug)]
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
    changes: broadcast::Sender<String>,
}

impl SqlitePreferenceStore {
    /// Wrap a pool whose schema already contains the `preferences` table
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self { pool, changes }
    }
}

fn decode_bool(key: &str, stored: &str, default: bool) -> bool {
    match stored {
        "true" | "1" => true,
        "false" | "0" => false,
        other => {
            warn!("Ignoring unreadable value '{}' for preference '{}'", other, key);
            default
        }
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    #[instrument(skip(self))]
    async fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT value FROM preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DaybookError::storage(format!("Failed to read preference: {e}")))?;

        let value = stored.map_or(default, |text| decode_bool(key, &text, default));
        debug!("Preference {} = {}", key, value);
        Ok(value)
    }

    #[instrument(skip(self))]
    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO preferences (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DaybookError::storage(format!("Failed to write preference: {e}")))?;

        info!("Set preference {} = {}", key, value);
        let _ = self.changes.send(key.to_string());
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}

/// Typed access to the application's preferences
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn PreferenceStore>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}

impl Settings {
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Whether deleting an event should ask for confirmation
    ///
    /// # Errors
    /// Returns an error if the preference cannot be read
    pub async fn confirm_before_delete(&self) -> Result<bool> {
        self.store
            .get_bool(CONFIRM_DELETE_KEY, CONFIRM_DELETE_DEFAULT)
            .await
    }

    /// Persist the confirm-before-delete toggle
    ///
    /// # Errors
    /// Returns an error if the preference cannot be written
    pub async fn set_confirm_before_delete(&self, value: bool) -> Result<()> {
        self.store.set_bool(CONFIRM_DELETE_KEY, value).await
    }

    /// Live value of the confirm-before-delete toggle
    #[must_use]
    pub fn observe_confirm_before_delete(&self) -> LiveQuery<bool> {
        observe_bool(
            Arc::clone(&self.store),
            CONFIRM_DELETE_KEY,
            CONFIRM_DELETE_DEFAULT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqliteEventStore;

    #[test]
    fn test_decode_bool() {
        assert!(decode_bool("k", "true", false));
        assert!(!decode_bool("k", "0", true));
        assert!(decode_bool("k", "maybe", true));
    }

    #[tokio::test]
    async fn test_confirm_delete_defaults_to_true() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let settings = Settings::new(store.preferences());

        assert!(settings.confirm_before_delete().await.unwrap());
    }

    #[tokio::test]
    async fn test_set_bool_persists() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let prefs = store.preferences();

        prefs.set_bool("compact_view", true).await.unwrap();
        assert!(prefs.get_bool("compact_view", false).await.unwrap());

        prefs.set_bool("compact_view", false).await.unwrap();
        assert!(!prefs.get_bool("compact_view", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_observe_confirm_delete_follows_writes() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let settings = Settings::new(store.preferences());
        let mut live = settings.observe_confirm_before_delete();

        assert_eq!(live.next().await, Some(Ok(true)));
        settings.set_confirm_before_delete(false).await.unwrap();
        assert_eq!(live.next().await, Some(Ok(false)));
    }
}
