//! Daybook CLI library
//!
//! Argument parsing and command execution for the `daybook` binary. Commands
//! drive the same editor and calendar state machines the app screens use.

use anyhow::{anyhow, bail, Context};
use chrono::{Days, Locale, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{builder::BoolishValueParser, Args, Parser, Subcommand};
use daybook_common::{parse_date, parse_time, truncate_string};
use daybook_core::{
    date_utils::{self, format_date, format_time},
    recurrence::occurrences_between,
    CalendarNavigator, DatePattern, EditorAction, EditorMode, Event, EventEditor,
    EventRepository, NavigationSignal, RepeatRule, Settings, SqliteEventStore, TimeUnit,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "daybook")]
#[command(about = "Calendar with recurring events, reminders and sub-tasks")]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to ~/.local/share/daybook/daybook.sqlite)
    #[arg(long, short)]
    pub database: Option<PathBuf>,

    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List the events of a day (default today)
    Day {
        /// Date such as 2024-01-08, 08/01/2024, today or tomorrow
        date: Option<String>,
    },
    /// Create an event
    Add {
        #[command(flatten)]
        fields: EventFields,
    },
    /// Change an existing event
    Edit {
        /// Event id
        id: i64,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Delete an event
    Delete {
        /// Event id
        id: i64,
        /// Skip the confirmation requirement
        #[arg(long, short)]
        yes: bool,
    },
    /// Mark an event done, or open again
    Toggle {
        /// Event id
        id: i64,
    },
    /// Print the events of a day whenever they change
    Watch {
        date: Option<String>,
    },
    /// List reminders that fire in the coming days
    Reminders {
        /// Number of days to look ahead
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        setting: PrefsCommand,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum PrefsCommand {
    /// Whether deleting requires --yes
    ConfirmDelete {
        /// New value (true/false); prints the current value when omitted
        #[arg(value_parser = BoolishValueParser::new())]
        value: Option<bool>,
    },
}

/// Event form fields; `none` clears an optional field
#[derive(Args, Debug, Default, PartialEq, Eq)]
pub struct EventFields {
    #[arg(long, short)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub end_date: Option<String>,
    #[arg(long)]
    pub end_time: Option<String>,
    /// daily, weekly, monthly, yearly or none
    #[arg(long)]
    pub repeat: Option<String>,
    /// Sub-task to append (repeatable)
    #[arg(long = "subtask")]
    pub sub_tasks: Vec<String>,
    /// Reminder before the start, such as 15m, 2h, 1d or 1w (repeatable)
    #[arg(long = "reminder")]
    pub reminders: Vec<String>,
}

impl EventFields {
    /// Editor actions reproducing these fields
    ///
    /// # Errors
    /// Returns an error naming the first field that cannot be parsed
    pub fn to_actions(&self) -> anyhow::Result<Vec<EditorAction>> {
        let mut actions = Vec::new();

        if let Some(title) = &self.title {
            actions.push(EditorAction::TitleChanged(title.clone()));
        }
        if let Some(description) = &self.description {
            actions.push(EditorAction::DescriptionChanged(description.clone()));
        }
        if let Some(date) = &self.date {
            actions.push(EditorAction::DateSelected(parse_day(date)?));
        }
        if let Some(time) = &self.time {
            actions.push(EditorAction::TimeSelected(parse_optional(time, parse_clock)?));
        }
        if let Some(end_date) = &self.end_date {
            actions.push(EditorAction::EndDateSelected(parse_optional(end_date, parse_day)?));
        }
        if let Some(end_time) = &self.end_time {
            actions.push(EditorAction::EndTimeSelected(parse_optional(end_time, parse_clock)?));
        }
        if let Some(repeat) = &self.repeat {
            let rule = parse_optional(repeat, |text| {
                text.parse::<RepeatRule>().map_err(anyhow::Error::from)
            })?;
            actions.push(EditorAction::RepeatSelected(rule));
        }
        for title in &self.sub_tasks {
            actions.push(EditorAction::SubTaskAdded(title.clone()));
        }
        for reminder in &self.reminders {
            let (offset, unit) = parse_reminder(reminder)?;
            actions.push(EditorAction::ReminderAdded { offset, unit });
        }

        Ok(actions)
    }
}

fn parse_optional<T>(
    value: &str,
    parse: impl Fn(&str) -> anyhow::Result<T>,
) -> anyhow::Result<Option<T>> {
    if value.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

/// Parse a calendar date, accepting `today`, `tomorrow` and `yesterday`
///
/// # Errors
/// Returns an error if the text matches no supported format
pub fn parse_day(value: &str) -> anyhow::Result<NaiveDate> {
    let today = date_utils::today();
    match value.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => today.succ_opt().ok_or_else(|| anyhow!("No date after {today}")),
        "yesterday" => today.pred_opt().ok_or_else(|| anyhow!("No date before {today}")),
        _ => parse_date(value).with_context(|| format!("Invalid date: {value}")),
    }
}

/// Parse a time of day
///
/// # Errors
/// Returns an error if the text matches no supported format
pub fn parse_clock(value: &str) -> anyhow::Result<NaiveTime> {
    parse_time(value).with_context(|| format!("Invalid time: {value}"))
}

/// Parse a reminder offset such as `15m`, `2h`, `1d` or `3 weeks`
///
/// # Errors
/// Returns an error for a missing amount or an unknown unit
pub fn parse_reminder(value: &str) -> anyhow::Result<(u32, TimeUnit)> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| anyhow!("Reminder '{value}' needs a unit (m, h, d or w)"))?;
    let (amount, unit) = value.split_at(split);
    let amount: u32 = amount
        .parse()
        .with_context(|| format!("Invalid reminder amount in '{value}'"))?;

    let unit = match unit.trim().to_lowercase().as_str() {
        "m" | "min" | "mins" | "minute" | "minutes" => TimeUnit::Minutes,
        "h" | "hour" | "hours" => TimeUnit::Hours,
        "d" | "day" | "days" => TimeUnit::Days,
        "w" | "week" | "weeks" => TimeUnit::Weeks,
        other => bail!("Unknown reminder unit '{other}' in '{value}'"),
    };
    Ok((amount, unit))
}

/// Everything a command needs besides its arguments
pub struct Session {
    pub store: Arc<SqliteEventStore>,
    pub locale: Locale,
    pub json: bool,
}

/// Run one command, writing its output to `out`
///
/// # Errors
/// Returns an error if the command fails or output cannot be written
pub async fn execute<W: Write>(command: Commands, session: &Session, out: &mut W) -> anyhow::Result<()> {
    let store = Arc::clone(&session.store);
    match command {
        Commands::Day { date } => {
            let date = date.as_deref().map_or_else(|| Ok(date_utils::today()), parse_day)?;
            let events = store.events_for_date(date).await?;
            if session.json {
                serde_json::to_writer_pretty(&mut *out, &events)?;
                writeln!(out)?;
            } else {
                print_events(date, &events, session.locale, out)?;
            }
        }
        Commands::Add { fields } => {
            let actions = fields.to_actions()?;
            let mut editor = EventEditor::add(store, None);
            let date = run_editor(&mut editor, actions).await?;
            report_saved(&editor.state().event, date, session, out)?;
        }
        Commands::Edit { id, fields } => {
            let actions = fields.to_actions()?;
            let mut editor = EventEditor::edit(store, Some(id)).await?;
            let date = run_editor(&mut editor, actions).await?;
            report_saved(&editor.state().event, date, session, out)?;
        }
        Commands::Delete { id, yes } => {
            let settings = Settings::new(store.preferences());
            if settings.confirm_before_delete().await? && !yes {
                bail!(
                    "Deleting event {id} needs confirmation: pass --yes, \
                     or run `daybook prefs confirm-delete false`"
                );
            }
            let event = find_event(&store, id).await?;
            let mut navigator = CalendarNavigator::new(store);
            navigator.select_date(event.date);
            navigator.open_context_menu(event.clone());
            navigator.delete_from_context_menu().await?;
            writeln!(out, "Deleted '{}'", event.title)?;
        }
        Commands::Toggle { id } => {
            let event = find_event(&store, id).await?;
            let mut navigator = CalendarNavigator::new(store);
            navigator.toggle_done(&event).await?;
            let state = if event.is_done { "open" } else { "done" };
            writeln!(out, "'{}' is now {state}", event.title)?;
        }
        Commands::Watch { date } => {
            let date = date.as_deref().map_or_else(|| Ok(date_utils::today()), parse_day)?;
            watch_day(store, date, session, out).await?;
        }
        Commands::Reminders { days } => {
            let events = store.all_events().await?;
            let now = chrono::Local::now().naive_local();
            let reminders = upcoming_reminders(&events, now, days);
            if session.json {
                serde_json::to_writer_pretty(&mut *out, &reminders)?;
                writeln!(out)?;
            } else {
                print_reminders(&reminders, session.locale, out)?;
            }
        }
        Commands::Prefs {
            setting: PrefsCommand::ConfirmDelete { value },
        } => {
            let settings = Settings::new(store.preferences());
            if let Some(value) = value {
                settings.set_confirm_before_delete(value).await?;
            }
            let current = settings.confirm_before_delete().await?;
            writeln!(out, "confirm-delete: {current}")?;
        }
    }
    Ok(())
}

async fn find_event(store: &SqliteEventStore, id: i64) -> anyhow::Result<Event> {
    store
        .get_event(id)
        .await?
        .ok_or_else(|| anyhow!("Event {id} not found"))
}

/// Feed `actions` to the editor and press Done
///
/// Returns the date the editor finished on.
async fn run_editor<M: EditorMode>(
    editor: &mut EventEditor<M>,
    actions: Vec<EditorAction>,
) -> anyhow::Result<NaiveDate> {
    let mut navigation = editor
        .take_navigation()
        .ok_or_else(|| anyhow!("Editor navigation already taken"))?;

    if editor.state().is_finished() {
        let reason = editor
            .state()
            .last_error
            .map_or_else(|| "editor closed".to_string(), |e| e.to_string());
        bail!("Cannot edit: {reason}");
    }

    for action in actions {
        editor.handle(action).await?;
    }

    let state = editor.state();
    if let Some(error) = state.title_error {
        bail!("Invalid title: {error:?}");
    }
    if let Some(error) = state.description_error {
        bail!("Invalid description: {error:?}");
    }

    editor.handle(EditorAction::DoneClicked).await?;
    match navigation.try_recv() {
        Ok(NavigationSignal::Finished { date }) => {
            debug!("Editor finished on {}", date);
            Ok(date)
        }
        Err(_) => bail!("Event was not saved"),
    }
}

fn report_saved<W: Write>(event: &Event, date: NaiveDate, session: &Session, out: &mut W) -> anyhow::Result<()> {
    info!("Saved event '{}'", event.title);
    if session.json {
        let summary = serde_json::json!({ "title": event.title, "date": date });
        writeln!(out, "{summary}")?;
    } else {
        writeln!(
            out,
            "Saved '{}' on {}",
            event.title,
            format_date(date, DatePattern::StandardDate, session.locale)
        )?;
    }
    Ok(())
}

async fn watch_day<W: Write>(
    store: Arc<SqliteEventStore>,
    date: NaiveDate,
    session: &Session,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut navigator = CalendarNavigator::new(store);
    navigator.select_date(date);

    loop {
        tokio::select! {
            next = navigator.next_events() => match next {
                Some(Ok(events)) => {
                    print_events(date, &events, session.locale, out)?;
                    out.flush()?;
                }
                Some(Err(e)) => writeln!(out, "Error: {e}")?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

/// Print the events of `date` to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_events<W: Write>(
    date: NaiveDate,
    events: &[Event],
    locale: Locale,
    writer: &mut W,
) -> std::io::Result<()> {
    writeln!(writer, "{}", format_date(date, DatePattern::TitleDate, locale))?;
    if events.is_empty() {
        writeln!(writer, "  No events")?;
        return Ok(());
    }

    for event in events {
        let check = if event.is_done { "x" } else { " " };
        let time = event.time.map_or_else(|| "all day".to_string(), format_time);
        write!(writer, "  [{check}] {time:>7}  {}", truncate_string(&event.title, 60))?;
        if let Some(rule) = event.repeat {
            write!(writer, "  ({})", rule.as_str().to_lowercase())?;
        }
        writeln!(writer, "  #{}", event.id)?;

        if !event.description.is_empty() {
            writeln!(writer, "        {}", truncate_string(&event.description, 72))?;
        }
        for sub_task in &event.sub_tasks {
            let check = if sub_task.is_done { "x" } else { " " };
            writeln!(writer, "        - [{check}] {}", sub_task.title)?;
        }
    }
    Ok(())
}

/// A reminder firing for one occurrence of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledReminder {
    pub fire_at: NaiveDateTime,
    pub occurrence: NaiveDate,
    pub event_id: i64,
    pub title: String,
}

/// Reminders of occurrences in the next `days` days that fire at or after `now`
#[must_use]
pub fn upcoming_reminders(events: &[Event], now: NaiveDateTime, days: u32) -> Vec<ScheduledReminder> {
    let from = now.date();
    let to = from.checked_add_days(Days::new(u64::from(days))).unwrap_or(from);

    let mut scheduled: Vec<ScheduledReminder> = events
        .iter()
        .filter(|event| !event.is_done && !event.reminders.is_empty())
        .flat_map(|event| {
            occurrences_between(event, from, to)
                .into_iter()
                .flat_map(move |occurrence| {
                    let start = occurrence.and_time(event.time.unwrap_or(NaiveTime::MIN));
                    event.reminders.iter().filter_map(move |reminder| {
                        let Some(fire_at) = reminder.fire_before(start) else {
                            warn!(
                                "Skipping reminder {} of event {}: lead time out of range",
                                reminder.id, event.id
                            );
                            return None;
                        };
                        Some(ScheduledReminder {
                            fire_at,
                            occurrence,
                            event_id: event.id,
                            title: event.title.clone(),
                        })
                    })
                })
        })
        .filter(|reminder| reminder.fire_at >= now)
        .collect();

    scheduled.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then(a.event_id.cmp(&b.event_id)));
    scheduled
}

fn print_reminders<W: Write>(
    reminders: &[ScheduledReminder],
    locale: Locale,
    writer: &mut W,
) -> std::io::Result<()> {
    if reminders.is_empty() {
        writeln!(writer, "No upcoming reminders")?;
        return Ok(());
    }

    writeln!(writer, "Found {} upcoming reminders:", reminders.len())?;
    for reminder in reminders {
        writeln!(
            writer,
            "  • {} {}  {} ({})",
            format_date(reminder.fire_at.date(), DatePattern::ShortDate, locale),
            format_time(reminder.fire_at.time()),
            reminder.title,
            format_date(reminder.occurrence, DatePattern::StandardDate, locale)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reminder() {
        assert_eq!(parse_reminder("15m").unwrap(), (15, TimeUnit::Minutes));
        assert_eq!(parse_reminder("2 hours").unwrap(), (2, TimeUnit::Hours));
        assert_eq!(parse_reminder("1w").unwrap(), (1, TimeUnit::Weeks));
        assert!(parse_reminder("15").is_err());
        assert!(parse_reminder("m").is_err());
        assert!(parse_reminder("3 fortnights").is_err());
    }

    #[test]
    fn test_parse_day_keywords() {
        let today = date_utils::today();
        assert_eq!(parse_day("Today").unwrap(), today);
        assert_eq!(parse_day("tomorrow").unwrap(), today.succ_opt().unwrap());
        assert_eq!(
            parse_day("2024-01-08").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
        assert!(parse_day("next blursday").is_err());
    }

    #[test]
    fn test_fields_to_actions() {
        let fields = EventFields {
            title: Some("Gym".into()),
            time: Some("none".into()),
            repeat: Some("weekly".into()),
            reminders: vec!["30m".into()],
            ..EventFields::default()
        };

        let actions = fields.to_actions().unwrap();
        assert_eq!(
            actions,
            vec![
                EditorAction::TitleChanged("Gym".into()),
                EditorAction::TimeSelected(None),
                EditorAction::RepeatSelected(Some(RepeatRule::Weekly)),
                EditorAction::ReminderAdded {
                    offset: 30,
                    unit: TimeUnit::Minutes
                },
            ]
        );
    }

    #[test]
    fn test_print_events_empty_day() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let mut output = Vec::new();
        print_events(date, &[], Locale::en_US, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "Monday, January 8\n  No events\n");
    }
}
