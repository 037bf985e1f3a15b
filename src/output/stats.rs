//! Plain-text statistics reports
//!
//! This module formats store counts and queue outcomes for the terminal.

use crate::queue::{FailedJob, QueueSnapshot};
use crate::storage::MediaStats;
use std::fmt::Write;
use std::time::Duration;

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Formats media counts
pub fn format_statistics(stats: &MediaStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Media Statistics ===\n");
    let _ = writeln!(out, "  Total media: {}", stats.total);
    let _ = writeln!(
        out,
        "  Images: {} ({:.1}%)",
        stats.images,
        percentage(stats.images, stats.total)
    );
    let _ = writeln!(
        out,
        "  Videos: {} ({:.1}%)",
        stats.videos,
        percentage(stats.videos, stats.total)
    );
    out
}

/// Prints media counts to stdout
pub fn print_statistics(stats: &MediaStats) {
    print!("{}", format_statistics(stats));
}

/// Formats the outcome of a batch of jobs
///
/// # Arguments
///
/// * `snapshot` - Queue counters after the batch drained
/// * `failures` - Recent permanent failures
/// * `elapsed` - Wall-clock time the batch took
pub fn format_run_summary(
    snapshot: &QueueSnapshot,
    failures: &[FailedJob],
    elapsed: Duration,
) -> String {
    let finished = (snapshot.completed + snapshot.failed) as u64;
    let mut out = String::new();

    let _ = writeln!(out, "=== Scrape Summary ===\n");
    let _ = writeln!(out, "  Jobs finished: {} in {:.1?}", finished, elapsed);
    let _ = writeln!(
        out,
        "  Completed: {} ({:.1}%)",
        snapshot.completed,
        percentage(snapshot.completed as u64, finished)
    );
    let _ = writeln!(out, "  Failed: {}", snapshot.failed);
    let _ = writeln!(out, "  Retries: {}", snapshot.retried);
    let _ = writeln!(out, "  Peak concurrency: {}", snapshot.peak_in_flight);

    if !failures.is_empty() {
        let _ = writeln!(out, "\nRecent Failures ({}):", failures.len());
        for failure in failures {
            let _ = writeln!(
                out,
                "  - {} after {} attempt(s): {}",
                failure.url, failure.attempts, failure.error
            );
        }
    }

    out
}

/// Prints the outcome of a batch of jobs to stdout
pub fn print_run_summary(snapshot: &QueueSnapshot, failures: &[FailedJob], elapsed: Duration) {
    print!("{}", format_run_summary(snapshot, failures, elapsed));
}
