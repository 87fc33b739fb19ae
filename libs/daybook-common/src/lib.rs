//! Daybook Common - shared constants and helpers for the Daybook calendar
//!
//! # Examples
//!
//! ```
//! use daybook_common::{parse_date, truncate_string, MAX_TITLE_LENGTH};
//!
//! assert_eq!(MAX_TITLE_LENGTH, 100);
//!
//! let date = parse_date("2024-01-08").unwrap();
//! assert_eq!(date.to_string(), "2024-01-08");
//!
//! assert_eq!(truncate_string("hello world", 5), "he...");
//! ```

pub mod constants;
pub mod utils;

pub use constants::*;
pub use utils::*;
