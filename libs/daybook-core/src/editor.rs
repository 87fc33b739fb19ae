//! Add/Edit event editing state machine
//!
//! [`EventEditor`] owns the transient form state of one editing session. The
//! add and edit flows share all field, picker and sub-task handling and differ
//! only in the [`EditorMode`] they are built with: how the draft is initially
//! populated and how it is written back on "Done".
//!
//! State is published through a [`watch`] channel. Leaving the screen is
//! signalled separately, exactly once, through a single-consumer channel
//! obtained with [`EventEditor::take_navigation`].

use crate::{
    date_utils,
    error::{DaybookError, Result},
    models::{renumber, Event, Reminder, RepeatRule, SubTask, TimeUnit},
    repository::EventRepository,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use daybook_common::{char_len, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Title validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleError {
    Empty,
    TooLong,
}

/// Description validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptionError {
    TooLong,
}

/// Validate an event title
///
/// Blank titles are [`TitleError::Empty`]; titles longer than
/// [`MAX_TITLE_LENGTH`] characters are [`TitleError::TooLong`].
#[must_use]
pub fn validate_title(title: &str) -> Option<TitleError> {
    if title.trim().is_empty() {
        Some(TitleError::Empty)
    } else if char_len(title) > MAX_TITLE_LENGTH {
        Some(TitleError::TooLong)
    } else {
        None
    }
}

/// Validate an event description
#[must_use]
pub fn validate_description(description: &str) -> Option<DescriptionError> {
    (char_len(description) > MAX_DESCRIPTION_LENGTH).then_some(DescriptionError::TooLong)
}

/// One of the four value pickers on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Picker {
    Date,
    Time,
    EndDate,
    EndTime,
}

impl Picker {
    fn phase(self) -> EditorPhase {
        match self {
            Self::Date => EditorPhase::DatePickerOpen,
            Self::Time => EditorPhase::TimePickerOpen,
            Self::EndDate => EditorPhase::EndDatePickerOpen,
            Self::EndTime => EditorPhase::EndTimePickerOpen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Editing,
    DatePickerOpen,
    TimePickerOpen,
    EndDatePickerOpen,
    EndTimePickerOpen,
    Committing,
    Finished,
}

/// One-shot signal telling the host screen to leave the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSignal {
    /// Editing is over; `date` is the date the calendar should show
    Finished { date: NaiveDate },
}

/// Snapshot of an editing session
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    /// The event being drafted
    pub event: Event,
    pub title_error: Option<TitleError>,
    pub description_error: Option<DescriptionError>,
    pub phase: EditorPhase,
    /// True until the edited event has been loaded
    pub loading: bool,
    /// Failure of the last load or commit, cleared by the next attempt
    pub last_error: Option<DaybookError>,
}

impl EditorState {
    fn new(event: Event, loading: bool) -> Self {
        let mut state = Self {
            title_error: None,
            description_error: None,
            phase: EditorPhase::Editing,
            loading,
            last_error: None,
            event,
        };
        state.revalidate();
        state
    }

    fn revalidate(&mut self) {
        self.title_error = validate_title(&self.event.title);
        self.description_error = validate_description(&self.event.description);
    }

    /// Whether every field passes validation
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.title_error.is_none() && self.description_error.is_none()
    }

    /// The picker currently shown, if any
    #[must_use]
    pub fn open_picker(&self) -> Option<Picker> {
        match self.phase {
            EditorPhase::DatePickerOpen => Some(Picker::Date),
            EditorPhase::TimePickerOpen => Some(Picker::Time),
            EditorPhase::EndDatePickerOpen => Some(Picker::EndDate),
            EditorPhase::EndTimePickerOpen => Some(Picker::EndTime),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == EditorPhase::Finished
    }

    fn accepts_edits(&self) -> bool {
        !self.loading && !matches!(self.phase, EditorPhase::Committing | EditorPhase::Finished)
    }

    fn close_picker(&mut self, picker: Picker) {
        if self.phase == picker.phase() {
            self.phase = EditorPhase::Editing;
        }
    }
}

/// User input understood by the editor
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    TitleChanged(String),
    DescriptionChanged(String),
    DateSelected(NaiveDate),
    TimeSelected(Option<NaiveTime>),
    EndDateSelected(Option<NaiveDate>),
    EndTimeSelected(Option<NaiveTime>),
    RepeatSelected(Option<RepeatRule>),
    PickerOpened(Picker),
    PickerDismissed(Picker),
    SubTaskAdded(String),
    SubTaskRemoved(Uuid),
    SubTaskRenamed { id: Uuid, title: String },
    SubTaskToggled(Uuid),
    SubTaskMoved { from: usize, to: usize },
    ReminderAdded { offset: u32, unit: TimeUnit },
    ReminderRemoved(Uuid),
    DoneClicked,
}

/// What distinguishes the add flow from the edit flow
#[async_trait]
pub trait EditorMode: Send + Sync {
    /// Draft shown when the editor opens
    ///
    /// # Errors
    /// `DaybookError::InvalidConstructionState` if the session cannot start
    fn initial_event(&self) -> Result<Event>;

    /// Whether [`load`](Self::load) must run before the draft is usable
    fn needs_load(&self) -> bool {
        false
    }

    /// Fetch the stored event the session edits
    ///
    /// # Errors
    /// `DaybookError::InvalidConstructionState` if the event does not exist,
    /// or a storage error
    async fn load(&self) -> Result<Option<Event>> {
        Ok(None)
    }

    /// Write the finished draft
    ///
    /// # Errors
    /// Returns the store's error if the write fails
    async fn commit(&self, event: &Event) -> Result<()>;
}

/// Create a new event, optionally on a pre-selected date
pub struct AddEvent {
    store: Arc<dyn EventRepository>,
    date: NaiveDate,
}

impl AddEvent {
    /// `selected_millis` is an epoch timestamp; only its local date is kept
    #[must_use]
    pub fn new(store: Arc<dyn EventRepository>, selected_millis: Option<i64>) -> Self {
        let date = match selected_millis.map(date_utils::local_date_from_millis) {
            Some(Ok(date)) => date,
            Some(Err(e)) => {
                warn!("Ignoring pre-selected date: {}", e);
                date_utils::today()
            }
            None => date_utils::today(),
        };
        Self { store, date }
    }

    /// Start on `date` directly
    #[must_use]
    pub fn on_date(store: Arc<dyn EventRepository>, date: NaiveDate) -> Self {
        Self { store, date }
    }
}

#[async_trait]
impl EditorMode for AddEvent {
    fn initial_event(&self) -> Result<Event> {
        Ok(Event::new("", self.date))
    }

    async fn commit(&self, event: &Event) -> Result<()> {
        let mut event = event.clone();
        event.id = 0;
        self.store.insert(&event).await.map(|_| ())
    }
}

/// Edit the stored event with the given id
pub struct EditEvent {
    store: Arc<dyn EventRepository>,
    id: Option<i64>,
}

impl EditEvent {
    #[must_use]
    pub fn new(store: Arc<dyn EventRepository>, id: Option<i64>) -> Self {
        Self { store, id }
    }

    fn valid_id(&self) -> Result<i64> {
        match self.id {
            Some(id) if id > 0 => Ok(id),
            Some(id) => Err(DaybookError::invalid_construction(format!(
                "Invalid event id: {id}"
            ))),
            None => Err(DaybookError::invalid_construction("No event id supplied")),
        }
    }
}

#[async_trait]
impl EditorMode for EditEvent {
    fn initial_event(&self) -> Result<Event> {
        let mut placeholder = Event::new("", date_utils::today());
        placeholder.id = self.valid_id()?;
        Ok(placeholder)
    }

    fn needs_load(&self) -> bool {
        true
    }

    async fn load(&self) -> Result<Option<Event>> {
        let id = self.valid_id()?;
        match self.store.get_event(id).await? {
            Some(event) => Ok(Some(event)),
            None => Err(DaybookError::invalid_construction(format!(
                "Event {id} does not exist"
            ))),
        }
    }

    async fn commit(&self, event: &Event) -> Result<()> {
        self.store.update(event).await
    }
}

/// Editing session shared by the add and edit flows
pub struct EventEditor<M: EditorMode> {
    mode: M,
    state: watch::Sender<EditorState>,
    navigation_tx: mpsc::UnboundedSender<NavigationSignal>,
    navigation_rx: Option<mpsc::UnboundedReceiver<NavigationSignal>>,
}

pub type AddEventEditor = EventEditor<AddEvent>;
pub type EditEventEditor = EventEditor<EditEvent>;

impl EventEditor<AddEvent> {
    /// Editor for a new event
    #[must_use]
    pub fn add(store: Arc<dyn EventRepository>, selected_millis: Option<i64>) -> Self {
        Self::new(AddEvent::new(store, selected_millis))
    }
}

impl EventEditor<EditEvent> {
    /// Editor for an existing event, already populated
    ///
    /// A missing id finishes the session immediately instead of failing.
    ///
    /// # Errors
    /// Returns a storage error if the event could not be read
    pub async fn edit(store: Arc<dyn EventRepository>, id: Option<i64>) -> Result<Self> {
        let mut editor = Self::new(EditEvent::new(store, id));
        editor.load().await?;
        Ok(editor)
    }
}

impl<M: EditorMode> EventEditor<M> {
    /// Start a session; a mode that cannot start finishes it immediately
    pub fn new(mode: M) -> Self {
        let (navigation_tx, navigation_rx) = mpsc::unbounded_channel();
        let initial = mode.initial_event();
        let draft = match &initial {
            Ok(event) => event.clone(),
            Err(_) => Event::new("", date_utils::today()),
        };
        let (state, _) = watch::channel(EditorState::new(draft, mode.needs_load()));

        let mut editor = Self {
            mode,
            state,
            navigation_tx,
            navigation_rx: Some(navigation_rx),
        };
        if let Err(e) = initial {
            warn!("Cannot start editing: {}", e);
            editor.abort(e);
        }
        editor
    }

    /// Current state snapshot
    #[must_use]
    pub fn state(&self) -> EditorState {
        self.state.borrow().clone()
    }

    /// Observe every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EditorState> {
        self.state.subscribe()
    }

    /// Take the navigation channel; only the first caller gets it
    pub fn take_navigation(&mut self) -> Option<mpsc::UnboundedReceiver<NavigationSignal>> {
        self.navigation_rx.take()
    }

    /// Populate the draft from storage when the mode requires it
    ///
    /// An event that no longer exists finishes the session.
    ///
    /// # Errors
    /// Returns a storage error; the session stays open with the error recorded
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<()> {
        let pending = {
            let state = self.state.borrow();
            state.loading && !state.is_finished()
        };
        if !pending {
            return Ok(());
        }

        match self.mode.load().await {
            Ok(Some(event)) => {
                debug!("Loaded event {} into editor", event.id);
                self.state.send_modify(|state| {
                    state.event = event;
                    state.loading = false;
                    state.last_error = None;
                    state.revalidate();
                });
                Ok(())
            }
            Ok(None) => {
                self.state.send_modify(|state| state.loading = false);
                Ok(())
            }
            Err(e @ DaybookError::InvalidConstructionState { .. }) => {
                warn!("Cannot edit: {}", e);
                self.abort(e);
                Ok(())
            }
            Err(e) => {
                self.state.send_modify(|state| state.last_error = Some(e.clone()));
                Err(e)
            }
        }
    }

    /// Apply one user action
    ///
    /// Actions are ignored while the stored event is still loading and once
    /// the session has finished.
    ///
    /// # Errors
    /// Returns `DaybookError::InvalidInput` for sub-task or reminder references
    /// that do not exist, and the store's error when "Done" fails to commit
    pub async fn handle(&mut self, action: EditorAction) -> Result<()> {
        if !self.state.borrow().accepts_edits() {
            debug!("Ignoring {:?}: form is not editable", action);
            return Ok(());
        }

        match action {
            EditorAction::DoneClicked => self.done().await,
            action => {
                let mut outcome = Ok(());
                self.state.send_if_modified(|state| {
                    let before = state.clone();
                    outcome = apply(state, action);
                    *state != before
                });
                outcome
            }
        }
    }

    async fn done(&mut self) -> Result<()> {
        let draft = {
            let state = self.state.borrow();
            if state.loading || !state.is_valid() {
                debug!("Done ignored: form is not ready");
                return Ok(());
            }
            state.event.clone()
        };

        self.state.send_modify(|state| {
            state.phase = EditorPhase::Committing;
            state.last_error = None;
        });

        match self.mode.commit(&draft).await {
            Ok(()) => {
                info!("Committed event '{}' on {}", draft.title, draft.date);
                self.finish(draft.date);
                Ok(())
            }
            Err(e) => {
                warn!("Commit failed: {}", e);
                self.state.send_modify(|state| {
                    state.phase = EditorPhase::Editing;
                    state.last_error = Some(e.clone());
                });
                Err(e)
            }
        }
    }

    fn abort(&mut self, error: DaybookError) {
        self.state.send_modify(|state| {
            state.loading = false;
            state.last_error = Some(error);
        });
        self.finish(date_utils::today());
    }

    fn finish(&mut self, date: NaiveDate) {
        let first = self.state.send_if_modified(|state| {
            if state.is_finished() {
                false
            } else {
                state.phase = EditorPhase::Finished;
                true
            }
        });
        if first {
            // The host may have gone away already
            let _ = self.navigation_tx.send(NavigationSignal::Finished { date });
        }
    }
}

fn sub_task_index(event: &Event, id: Uuid) -> Result<usize> {
    event
        .sub_tasks
        .iter()
        .position(|sub_task| sub_task.id == id)
        .ok_or_else(|| DaybookError::invalid_input(format!("Unknown sub-task {id}")))
}

fn apply(state: &mut EditorState, action: EditorAction) -> Result<()> {
    let event = &mut state.event;
    match action {
        EditorAction::TitleChanged(title) => {
            event.title = title;
            state.revalidate();
        }
        EditorAction::DescriptionChanged(description) => {
            event.description = description;
            state.revalidate();
        }
        EditorAction::DateSelected(date) => {
            event.date = date;
            if event.end_date.is_some_and(|end| end < date) {
                event.end_date = Some(date);
            }
            state.close_picker(Picker::Date);
        }
        EditorAction::TimeSelected(time) => {
            event.time = time;
            if time.is_none() {
                event.end_time = None;
            }
            state.close_picker(Picker::Time);
        }
        EditorAction::EndDateSelected(end_date) => {
            event.end_date = end_date.map(|end| end.max(event.date));
            state.close_picker(Picker::EndDate);
        }
        EditorAction::EndTimeSelected(end_time) => {
            event.end_time = end_time;
            state.close_picker(Picker::EndTime);
        }
        EditorAction::RepeatSelected(repeat) => event.repeat = repeat,
        EditorAction::PickerOpened(picker) => state.phase = picker.phase(),
        EditorAction::PickerDismissed(picker) => state.close_picker(picker),
        EditorAction::SubTaskAdded(title) => {
            let mut sub_task = SubTask::new(title);
            sub_task.event_id = event.id;
            event.sub_tasks.push(sub_task);
            renumber(&mut event.sub_tasks);
        }
        EditorAction::SubTaskRemoved(id) => {
            let index = sub_task_index(event, id)?;
            event.sub_tasks.remove(index);
            renumber(&mut event.sub_tasks);
        }
        EditorAction::SubTaskRenamed { id, title } => {
            let index = sub_task_index(event, id)?;
            event.sub_tasks[index].title = title;
        }
        EditorAction::SubTaskToggled(id) => {
            let index = sub_task_index(event, id)?;
            event.sub_tasks[index].is_done = !event.sub_tasks[index].is_done;
        }
        EditorAction::SubTaskMoved { from, to } => {
            let len = event.sub_tasks.len();
            if from >= len || to >= len {
                return Err(DaybookError::invalid_input(format!(
                    "Cannot move sub-task {from} to {to} in a list of {len}"
                )));
            }
            let sub_task = event.sub_tasks.remove(from);
            event.sub_tasks.insert(to, sub_task);
            renumber(&mut event.sub_tasks);
        }
        EditorAction::ReminderAdded { offset, unit } => {
            let mut reminder = Reminder::new(offset, unit);
            reminder.event_id = event.id;
            event.reminders.push(reminder);
        }
        EditorAction::ReminderRemoved(id) => {
            let before = event.reminders.len();
            event.reminders.retain(|reminder| reminder.id != id);
            if event.reminders.len() == before {
                return Err(DaybookError::invalid_input(format!("Unknown reminder {id}")));
            }
        }
        EditorAction::DoneClicked => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockEventStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add_editor(store: &Arc<MockEventStore>) -> AddEventEditor {
        EventEditor::new(AddEvent::on_date(store.clone(), date(2024, 5, 10)))
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title(""), Some(TitleError::Empty));
        assert_eq!(validate_title("   "), Some(TitleError::Empty));
        assert_eq!(validate_title("Lunch"), None);
        assert_eq!(validate_title(&"a".repeat(100)), None);
        assert_eq!(validate_title(&"a".repeat(101)), Some(TitleError::TooLong));
    }

    #[test]
    fn test_validate_description() {
        assert_eq!(validate_description(""), None);
        assert_eq!(validate_description(&"d".repeat(2000)), None);
        assert_eq!(
            validate_description(&"d".repeat(2001)),
            Some(DescriptionError::TooLong)
        );
    }

    #[tokio::test]
    async fn test_new_add_editor_is_invalid_until_titled() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = add_editor(&store);
        assert!(!editor.state().is_valid());
        assert_eq!(editor.state().title_error, Some(TitleError::Empty));

        editor
            .handle(EditorAction::TitleChanged("Standup".into()))
            .await
            .unwrap();
        assert!(editor.state().is_valid());
    }

    #[tokio::test]
    async fn test_opening_a_picker_closes_the_other() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = add_editor(&store);

        editor.handle(EditorAction::PickerOpened(Picker::Date)).await.unwrap();
        editor.handle(EditorAction::PickerOpened(Picker::Time)).await.unwrap();
        assert_eq!(editor.state().open_picker(), Some(Picker::Time));

        editor.handle(EditorAction::PickerDismissed(Picker::Date)).await.unwrap();
        assert_eq!(editor.state().phase, EditorPhase::TimePickerOpen);

        let nine = NaiveTime::from_hms_opt(9, 0, 0);
        editor.handle(EditorAction::TimeSelected(nine)).await.unwrap();
        assert_eq!(editor.state().phase, EditorPhase::Editing);
        assert_eq!(editor.state().event.time, nine);
    }

    #[tokio::test]
    async fn test_clearing_time_clears_end_time() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = add_editor(&store);
        editor
            .handle(EditorAction::TimeSelected(NaiveTime::from_hms_opt(9, 0, 0)))
            .await
            .unwrap();
        editor
            .handle(EditorAction::EndTimeSelected(NaiveTime::from_hms_opt(10, 0, 0)))
            .await
            .unwrap();

        editor.handle(EditorAction::TimeSelected(None)).await.unwrap();
        assert_eq!(editor.state().event.end_time, None);
    }

    #[tokio::test]
    async fn test_end_date_never_precedes_date() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = add_editor(&store);

        editor
            .handle(EditorAction::EndDateSelected(Some(date(2024, 5, 1))))
            .await
            .unwrap();
        assert_eq!(editor.state().event.end_date, Some(date(2024, 5, 10)));

        editor
            .handle(EditorAction::EndDateSelected(Some(date(2024, 5, 12))))
            .await
            .unwrap();
        editor
            .handle(EditorAction::DateSelected(date(2024, 5, 20)))
            .await
            .unwrap();
        assert_eq!(editor.state().event.end_date, Some(date(2024, 5, 20)));
    }

    #[tokio::test]
    async fn test_sub_task_edits_keep_positions_dense() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = add_editor(&store);
        for title in ["one", "two", "three"] {
            editor
                .handle(EditorAction::SubTaskAdded(title.into()))
                .await
                .unwrap();
        }

        editor
            .handle(EditorAction::SubTaskMoved { from: 2, to: 0 })
            .await
            .unwrap();
        let first = editor.state().event.sub_tasks[1].id;
        editor.handle(EditorAction::SubTaskRemoved(first)).await.unwrap();

        let state = editor.state();
        let titles: Vec<&str> = state.event.sub_tasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "two"]);
        let positions: Vec<u32> = state.event.sub_tasks.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_unknown_sub_task_is_rejected() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = add_editor(&store);

        let result = editor.handle(EditorAction::SubTaskToggled(Uuid::new_v4())).await;
        assert!(matches!(result, Err(DaybookError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_done_ignored_while_invalid() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = add_editor(&store);
        let mut navigation = editor.take_navigation().unwrap();

        editor.handle(EditorAction::DoneClicked).await.unwrap();

        assert_eq!(editor.state().phase, EditorPhase::Editing);
        assert!(store.inserted().is_empty());
        assert!(navigation.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_commit_returns_to_editing() {
        let store = Arc::new(MockEventStore::new());
        store.set_fail_writes(true);
        let mut editor = add_editor(&store);
        let mut navigation = editor.take_navigation().unwrap();
        editor
            .handle(EditorAction::TitleChanged("Flaky".into()))
            .await
            .unwrap();

        let result = editor.handle(EditorAction::DoneClicked).await;

        assert!(matches!(result, Err(DaybookError::Storage { .. })));
        let state = editor.state();
        assert_eq!(state.phase, EditorPhase::Editing);
        assert!(state.last_error.is_some());
        assert!(navigation.try_recv().is_err());

        store.set_fail_writes(false);
        editor.handle(EditorAction::DoneClicked).await.unwrap();
        assert_eq!(
            navigation.try_recv().unwrap(),
            NavigationSignal::Finished { date: date(2024, 5, 10) }
        );
        assert_eq!(store.inserted().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_without_id_finishes_immediately() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = EventEditor::edit(store, None).await.unwrap();
        let mut navigation = editor.take_navigation().unwrap();

        assert!(editor.state().is_finished());
        assert!(matches!(
            editor.state().last_error,
            Some(DaybookError::InvalidConstructionState { .. })
        ));
        assert!(matches!(
            navigation.try_recv().unwrap(),
            NavigationSignal::Finished { .. }
        ));
        assert!(navigation.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_edit_of_missing_event_finishes() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = EventEditor::edit(store, Some(42)).await.unwrap();

        assert!(editor.state().is_finished());
        assert!(editor.take_navigation().unwrap().try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_edits_before_load_are_ignored() {
        let mut stored = Event::new("Stored", date(2024, 5, 10));
        stored.description = "From storage".to_string();
        let store = Arc::new(MockEventStore::with_events(vec![stored]));
        let mut editor = EventEditor::new(EditEvent::new(store, Some(1)));
        assert!(editor.state().loading);

        editor
            .handle(EditorAction::TitleChanged("Typed early".into()))
            .await
            .unwrap();
        editor
            .handle(EditorAction::PickerOpened(Picker::Date))
            .await
            .unwrap();
        assert_ne!(editor.state().event.title, "Typed early");
        assert_eq!(editor.state().phase, EditorPhase::Editing);

        editor.load().await.unwrap();
        let state = editor.state();
        assert!(!state.loading);
        assert_eq!(state.event.title, "Stored");
        assert_eq!(state.event.description, "From storage");

        editor
            .handle(EditorAction::TitleChanged("Typed after".into()))
            .await
            .unwrap();
        assert_eq!(editor.state().event.title, "Typed after");
    }

    #[tokio::test]
    async fn test_actions_after_finish_are_ignored() {
        let store = Arc::new(MockEventStore::new());
        let mut editor = EventEditor::edit(store, Some(-3)).await.unwrap();

        editor
            .handle(EditorAction::TitleChanged("late".into()))
            .await
            .unwrap();
        assert_eq!(editor.state().event.title, "");
    }
}
