//! Moonlight command-line shell
//!
//! Headless driver for the editing engine: opens SVG documents, replays
//! operation scripts and writes the exported result.

mod app;
mod script;

pub use app::{App, AppError, run_operations, shortcut_table, write_output};
pub use script::{Operation, parse_script};
