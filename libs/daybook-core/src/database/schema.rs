//! SQLite schema for the Daybook store

/// Statements run, in order, every time a store is opened
pub const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL,
        time TEXT,
        end_date TEXT,
        end_time TEXT,
        repeat TEXT,
        is_done INTEGER NOT NULL DEFAULT 0
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_events_date ON events (date)",
    r"
    CREATE TABLE IF NOT EXISTS sub_tasks (
        id TEXT PRIMARY KEY,
        event_id INTEGER NOT NULL REFERENCES events (id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        is_done INTEGER NOT NULL DEFAULT 0,
        position INTEGER NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_sub_tasks_event ON sub_tasks (event_id, position)",
    r"
    CREATE TABLE IF NOT EXISTS reminders (
        id TEXT PRIMARY KEY,
        event_id INTEGER NOT NULL REFERENCES events (id) ON DELETE CASCADE,
        offset_value INTEGER NOT NULL,
        unit TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_reminders_event ON reminders (event_id)",
    r"
    CREATE TABLE IF NOT EXISTS preferences (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    ",
];
