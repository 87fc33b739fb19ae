//! Calendar navigation state
//!
//! The calendar pages through days infinitely in both directions. Page
//! [`INITIAL_PAGE`] is the day the navigator was created; every other page is
//! that many days before or after it.

use crate::{
    date_utils,
    error::{DaybookError, Result},
    live::LiveQuery,
    models::Event,
    repository::{observe_events_for_date, EventRepository},
};
use chrono::{Days, NaiveDate};
use daybook_common::INITIAL_PAGE;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Date shown on page `index` when [`INITIAL_PAGE`] shows `today`
///
/// # Errors
/// Returns `DaybookError::InvalidInput` when the page lies outside the
/// representable date range
pub fn page_to_date(today: NaiveDate, index: i64) -> Result<NaiveDate> {
    let out_of_range = || DaybookError::invalid_input(format!("Page {index} is out of range"));
    let offset = index.checked_sub(INITIAL_PAGE).ok_or_else(out_of_range)?;
    let date = if offset >= 0 {
        today.checked_add_days(Days::new(offset.unsigned_abs()))
    } else {
        today.checked_sub_days(Days::new(offset.unsigned_abs()))
    };
    date.ok_or_else(out_of_range)
}

/// Page showing `date` when [`INITIAL_PAGE`] shows `today`
#[must_use]
pub fn date_to_page(today: NaiveDate, date: NaiveDate) -> i64 {
    INITIAL_PAGE + (date - today).num_days()
}

/// Snapshot of the calendar screen
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarState {
    pub selected_date: NaiveDate,
    pub current_page: i64,
    /// Event whose context menu is open
    pub context_menu: Option<Event>,
    pub last_error: Option<DaybookError>,
}

/// Tracks the selected day and keeps a live query of its events
pub struct CalendarNavigator {
    store: Arc<dyn EventRepository>,
    today: NaiveDate,
    state: watch::Sender<CalendarState>,
    events: Option<LiveQuery<Vec<Event>>>,
}

impl CalendarNavigator {
    /// Navigator anchored on the local current date
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(store: Arc<dyn EventRepository>) -> Self {
        Self::with_today(store, date_utils::today())
    }

    /// Navigator anchored on `today`
    #[must_use]
    pub fn with_today(store: Arc<dyn EventRepository>, today: NaiveDate) -> Self {
        let (state, _) = watch::channel(CalendarState {
            selected_date: today,
            current_page: INITIAL_PAGE,
            context_menu: None,
            last_error: None,
        });
        let events = Some(observe_events_for_date(Arc::clone(&store), today));
        Self {
            store,
            today,
            state,
            events,
        }
    }

    /// Date shown on page `index`
    ///
    /// # Errors
    /// Returns `DaybookError::InvalidInput` when the page lies outside the
    /// representable date range
    pub fn page_index_to_date(&self, index: i64) -> Result<NaiveDate> {
        page_to_date(self.today, index)
    }

    /// Page showing `date`
    #[must_use]
    pub fn date_to_page_index(&self, date: NaiveDate) -> i64 {
        date_to_page(self.today, date)
    }

    /// The date page [`INITIAL_PAGE`] stands for
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    #[must_use]
    pub fn state(&self) -> CalendarState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CalendarState> {
        self.state.subscribe()
    }

    /// Live events of the selected date
    pub fn events(&mut self) -> Option<&mut LiveQuery<Vec<Event>>> {
        self.events.as_mut()
    }

    /// Wait for the next event list of the selected date
    pub async fn next_events(&mut self) -> Option<Result<Vec<Event>>> {
        match self.events.as_mut() {
            Some(live) => live.next().await,
            None => None,
        }
    }

    /// Select `date` and move to its page
    pub fn select_date(&mut self, date: NaiveDate) {
        let page = self.date_to_page_index(date);
        self.show(date, page);
    }

    /// The pager settled on `index`
    ///
    /// # Errors
    /// Returns `DaybookError::InvalidInput` for pages outside the date range
    pub fn page_changed(&mut self, index: i64) -> Result<()> {
        let date = self.page_index_to_date(index)?;
        self.show(date, index);
        Ok(())
    }

    pub fn jump_to_today(&mut self) {
        self.select_date(self.today);
    }

    fn show(&mut self, date: NaiveDate, page: i64) {
        let changed = self.state.send_if_modified(|state| {
            if state.selected_date == date && state.current_page == page {
                return false;
            }
            state.selected_date = date;
            state.current_page = page;
            true
        });
        if !changed {
            return;
        }

        debug!("Calendar moved to {} (page {})", date, page);
        if let Some(previous) = self.events.take() {
            previous.cancel();
        }
        self.events = Some(observe_events_for_date(Arc::clone(&self.store), date));
    }

    pub fn open_context_menu(&mut self, event: Event) {
        self.state.send_modify(|state| state.context_menu = Some(event));
    }

    pub fn close_context_menu(&mut self) {
        self.state.send_if_modified(|state| state.context_menu.take().is_some());
    }

    /// Delete the context-menu event and close the menu
    ///
    /// Does nothing when no menu is open.
    ///
    /// # Errors
    /// Returns the store's error; the menu then stays open
    #[instrument(skip(self))]
    pub async fn delete_from_context_menu(&mut self) -> Result<()> {
        let target = self.state.borrow().context_menu.clone();
        let Some(target) = target else {
            debug!("No context menu open, nothing to delete");
            return Ok(());
        };

        match self.store.delete(&target).await {
            Ok(()) => {
                info!("Deleted event {} from context menu", target.id);
                self.state.send_modify(|state| {
                    state.context_menu = None;
                    state.last_error = None;
                });
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete event {}: {}", target.id, e);
                self.state.send_modify(|state| state.last_error = Some(e.clone()));
                Err(e)
            }
        }
    }

    /// Flip the completion flag of `event`
    ///
    /// # Errors
    /// Returns the store's error
    #[instrument(skip(self, event), fields(id = event.id))]
    pub async fn toggle_done(&mut self, event: &Event) -> Result<()> {
        let mut updated = event.clone();
        updated.is_done = !updated.is_done;
        match self.store.update(&updated).await {
            Ok(()) => {
                debug!("Event {} done = {}", updated.id, updated.is_done);
                Ok(())
            }
            Err(e) => {
                self.state.send_modify(|state| state.last_error = Some(e.clone()));
                Err(e)
            }
        }
    }
}
