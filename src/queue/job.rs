//! Scrape job lifecycle
//!
//! This module defines the states a job moves through between submission and
//! its final outcome, and the job record itself.

use crate::queue::QueueError;
use std::fmt;

/// Represents the current state of a scrape job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    // ===== Active States =====
    /// Submitted and waiting for a worker slot
    Pending,

    /// A worker is running the job
    InFlight,

    /// The last attempt failed; waiting out the backoff before another
    Retrying,

    // ===== Terminal States =====
    /// The page was fetched and its media stored
    Completed,

    /// Every allowed attempt failed
    FailedPermanently,
}

impl JobState {
    /// Returns true if no further work will happen for the job
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::FailedPermanently)
    }

    /// Returns true if the move from `self` to `next` is a legal step
    ///
    /// Legal moves: `Pending -> InFlight`, `InFlight -> Completed`,
    /// `InFlight -> Retrying`, `InFlight -> FailedPermanently` and
    /// `Retrying -> InFlight`.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight)
                | (Self::InFlight, Self::Completed)
                | (Self::InFlight, Self::Retrying)
                | (Self::InFlight, Self::FailedPermanently)
                | (Self::Retrying, Self::InFlight)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Retrying => "retrying",
            Self::Completed => "completed",
            Self::FailedPermanently => "failed_permanently",
        }
    }

    /// Returns all possible job states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::InFlight,
            Self::Retrying,
            Self::Completed,
            Self::FailedPermanently,
        ]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of work: scrape a single page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeJob {
    pub target_url: String,

    /// Attempts started so far, the current one included
    pub attempt_count: u32,

    pub state: JobState,
}

impl ScrapeJob {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            attempt_count: 0,
            state: JobState::Pending,
        }
    }

    /// Moves the job to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: JobState) -> Result<(), QueueError> {
        if !self.state.can_transition_to(next) {
            return Err(QueueError::InvalidTransition {
                url: self.target_url.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Marks the job in flight and counts the attempt
    pub fn begin_attempt(&mut self) -> Result<u32, QueueError> {
        self.transition(JobState::InFlight)?;
        self.attempt_count += 1;
        Ok(self.attempt_count)
    }

    /// Records a failed attempt
    ///
    /// Moves to `Retrying` while fewer than `max_attempts` attempts have been
    /// made, otherwise to `FailedPermanently`. Returns the new state.
    pub fn fail_attempt(&mut self, max_attempts: u32) -> Result<JobState, QueueError> {
        let next = if self.attempt_count < max_attempts {
            JobState::Retrying
        } else {
            JobState::FailedPermanently
        };
        self.transition(next)?;
        Ok(next)
    }
}
