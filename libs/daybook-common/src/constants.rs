//! Constants shared across the Daybook crates

/// Default database filename
pub const DATABASE_FILENAME: &str = "daybook.sqlite";

/// Directory (relative to `$HOME`) holding the default database
pub const DATA_DIR: &str = ".local/share/daybook";

/// Maximum number of characters in an event title
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum number of characters in an event description
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Page index that maps to "today" when a calendar is created.
///
/// Half of `i32::MAX` leaves room for paging in both directions.
pub const INITIAL_PAGE: i64 = (i32::MAX / 2) as i64;

/// Preference key for the "confirm before delete" toggle
pub const CONFIRM_DELETE_KEY: &str = "confirm_before_delete";

/// Default value of the "confirm before delete" toggle
pub const CONFIRM_DELETE_DEFAULT: bool = true;

/// Date formats accepted on input, tried in order
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];

/// Time formats accepted on input, tried in order
pub const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p"];
