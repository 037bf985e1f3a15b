//! Output module for human- and machine-readable reports
//!
//! This module handles:
//! - Printing media counts and queue summaries to stdout
//! - Rendering result pages as JSON

pub mod stats;

pub use stats::{format_run_summary, format_statistics, print_run_summary, print_statistics};

use serde::Serialize;

/// Renders any result type as pretty-printed JSON
///
/// Field names follow the camelCase serde renames on the result types, so
/// the output matches what a JSON API would return.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Prints a result as JSON to stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", to_json(value)?);
    Ok(())
}
