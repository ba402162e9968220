//! Keymap text format
//!
//! Line-oriented, case-insensitive and whitespace-delimited:
//!
//! ```text
//! FreePiano 1.8
//! GroupCount 1
//! Group 0
//! Transpose Ch_0 2
//! Keydown A            Note Ch_0 C4
//! Keydown Space        Sustain Ch_0 Set 127
//! Keyup   Space        Sustain Ch_0 Set 0
//! Label   A            Do
//! ```
//!
//! A `FreePiano` line declares the format version of the lines after it;
//! documents without one are read with the oldest rules.

mod cursor;
pub mod names;
mod parser;
mod writer;


pub use cursor::{parse_number, Cursor};
pub use parser::{parse, parse_event, parse_into, ParseReport, SkippedLine};
pub use writer::{format_event, serialize};

use crate::store::BindingStore;

/// Keymap compiled into the binary, used when no keymap file is configured
pub const DEFAULT_KEYMAP: &str = include_str!("default.map");

/// Store built from [`DEFAULT_KEYMAP`]
pub fn default_store() -> BindingStore {
    parse(DEFAULT_KEYMAP).0
}
