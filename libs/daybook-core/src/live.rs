//! Live queries over a change feed
//!
//! A [`LiveQuery`] owns a background task that runs its query once, then
//! again after every change notification, and publishes the result whenever
//! it differs from the previous one. Results come from a single task, so they
//! are never reordered; bursts of changes are coalesced into one re-query.
//! Dropping the handle aborts the task.

use crate::error::Result;
use std::future::Future;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handle to a running live query
#[derive(Debug)]
pub struct LiveQuery<T> {
    receiver: watch::Receiver<Option<Result<T>>>,
    task: JoinHandle<()>,
}

impl<T: Clone> LiveQuery<T> {
    /// Wait for the next emitted result
    ///
    /// The first call yields the initial query result. Returns `None` once the
    /// change feed has closed and no further results will arrive.
    pub async fn next(&mut self) -> Option<Result<T>> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(value) = self.receiver.borrow_and_update().clone() {
                return Some(value);
            }
        }
    }

    /// Most recent result, if the first query has completed
    #[must_use]
    pub fn latest(&self) -> Option<Result<T>> {
        self.receiver.borrow().clone()
    }

    /// Whether a result is waiting that [`next`](Self::next) has not returned yet
    ///
    /// # Errors
    /// Returns an error if the background task has stopped
    pub fn has_pending(&self) -> std::result::Result<bool, watch::error::RecvError> {
        self.receiver.has_changed()
    }

    /// Stop the query and release its resources
    pub fn cancel(self) {
        // Drop aborts the task
    }

    /// Whether the background task is still running
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start a live query driven by `changes`
///
/// The receiver must be subscribed before the first query runs so no write
/// between subscription and query is missed.
pub fn spawn_live_query<T, C, F, Fut>(mut changes: broadcast::Receiver<C>, query: F) -> LiveQuery<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    C: Clone + Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let (sender, receiver) = watch::channel(None);

    let task = tokio::spawn(async move {
        loop {
            let result = query().await;
            if let Err(e) = &result {
                warn!("Live query failed: {}", e);
            }

            let changed = sender.send_if_modified(|current| {
                if current.as_ref() == Some(&result) {
                    false
                } else {
                    *current = Some(result);
                    true
                }
            });
            if changed {
                debug!("Live query emitted a new result");
            }

            match changes.recv().await {
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Live query lagged by {} changes, re-querying", skipped);
                }
                Err(RecvError::Closed) => break,
            }

            // Fold any queued notifications into this re-query
            loop {
                match changes.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Closed) => return,
                }
            }

            if sender.is_closed() {
                break;
            }
        }
    });

    LiveQuery { receiver, task }
}
