//! Job queue and worker pool
//!
//! Submitted URLs become [`ScrapeJob`]s that a bounded pool of workers runs
//! through a [`JobProcessor`]. Failed jobs are retried with exponential
//! backoff up to a fixed number of attempts; jobs that exhaust them are kept
//! in a bounded recent-failures list for diagnostics.

mod job;
mod pool;

pub use job::{JobState, ScrapeJob};
pub use pool::{FailedJob, JobQueue, QueueSnapshot};

use crate::MagpieError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the queue itself
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Job queue is closed")]
    Closed,

    #[error("Invalid job transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: JobState,
        to: JobState,
    },
}

/// Work performed for each job attempt
///
/// An `Err` (or a panic) counts as a failed attempt and may be retried.
#[async_trait]
pub trait JobProcessor: Send + Sync + 'static {
    async fn process(&self, job: &ScrapeJob) -> Result<(), MagpieError>;
}
