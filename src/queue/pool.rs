//! Bounded worker pool
//!
//! A dispatcher task drains the submission channel and holds one semaphore
//! permit per running job, so at most `concurrency` jobs are ever in flight.
//! The permit is released while a failed job waits out its backoff.

use crate::config::QueueConfig;
use crate::queue::{JobProcessor, JobState, QueueError, ScrapeJob};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, Notify, OwnedSemaphorePermit, Semaphore};

/// A job that exhausted its attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedJob {
    pub url: String,
    pub attempts: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// Point-in-time queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    /// Submitted and waiting for a worker slot
    pub pending: usize,
    pub in_flight: usize,
    /// Waiting out a backoff before the next attempt
    pub retrying: usize,
    pub completed: usize,
    /// Retries scheduled so far
    pub retried: usize,
    pub failed: usize,
    /// Highest number of jobs observed in flight at once
    pub peak_in_flight: usize,
}

#[derive(Default)]
struct Counters {
    pending: AtomicUsize,
    in_flight: AtomicUsize,
    retrying: AtomicUsize,
    completed: AtomicUsize,
    retried: AtomicUsize,
    failed: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

struct Shared {
    config: QueueConfig,
    semaphore: Arc<Semaphore>,
    processor: Arc<dyn JobProcessor>,
    counters: Counters,
    /// Jobs submitted and not yet in a terminal state
    outstanding: AtomicUsize,
    failures: Mutex<VecDeque<FailedJob>>,
    idle: Notify,
}

impl Shared {
    fn failures(&self) -> MutexGuard<'_, VecDeque<FailedJob>> {
        // The list holds plain data, so a poisoned lock is still usable
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn finish_job(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn record_failure(&self, job: &ScrapeJob, error: String) {
        self.counters.failed.fetch_add(1, Ordering::Relaxed);

        let mut failures = self.failures();
        failures.push_back(FailedJob {
            url: job.target_url.clone(),
            attempts: job.attempt_count,
            error,
            failed_at: Utc::now(),
        });
        while failures.len() > self.config.failure_history {
            failures.pop_front();
        }
    }
}

/// Handle to a running job queue
///
/// Submission is fire-and-forget: callers learn how many jobs were queued,
/// never their outcome. Outcomes surface only through the store and through
/// [`JobQueue::snapshot`] and [`JobQueue::recent_failures`].
pub struct JobQueue {
    sender: mpsc::UnboundedSender<ScrapeJob>,
    shared: Arc<Shared>,
}

impl JobQueue {
    /// Starts the dispatcher on the current Tokio runtime
    pub fn start(config: QueueConfig, processor: Arc<dyn JobProcessor>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            semaphore: Arc::new(Semaphore::new(config.concurrency.max(1))),
            config,
            processor,
            counters: Counters::default(),
            outstanding: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
            idle: Notify::new(),
        });

        tracing::info!(
            "Job queue started: {} workers, {} attempts per job",
            shared.config.concurrency,
            shared.config.max_attempts
        );

        tokio::spawn(dispatch(receiver, Arc::clone(&shared)));

        Self { sender, shared }
    }

    /// Queues one job per URL, duplicates included
    ///
    /// # Returns
    ///
    /// The number of jobs queued
    pub fn submit(&self, urls: Vec<String>) -> Result<usize, QueueError> {
        let count = urls.len();

        for url in urls {
            self.shared.outstanding.fetch_add(1, Ordering::SeqCst);
            self.shared.counters.pending.fetch_add(1, Ordering::Relaxed);

            if self.sender.send(ScrapeJob::new(url)).is_err() {
                self.shared.counters.pending.fetch_sub(1, Ordering::Relaxed);
                self.shared.finish_job();
                return Err(QueueError::Closed);
            }
        }

        tracing::debug!("Queued {} jobs", count);
        Ok(count)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let c = &self.shared.counters;
        QueueSnapshot {
            pending: c.pending.load(Ordering::Relaxed),
            in_flight: c.in_flight.load(Ordering::Relaxed),
            retrying: c.retrying.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            retried: c.retried.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            peak_in_flight: c.peak_in_flight.load(Ordering::Relaxed),
        }
    }

    /// Most recent permanent failures, oldest first
    pub fn recent_failures(&self) -> Vec<FailedJob> {
        self.shared.failures().iter().cloned().collect()
    }

    /// Number of submitted jobs that have not yet completed or failed
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }

    /// Resolves once every submitted job has reached a terminal state
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

async fn dispatch(mut receiver: mpsc::UnboundedReceiver<ScrapeJob>, shared: Arc<Shared>) {
    while let Some(job) = receiver.recv().await {
        let permit = match Arc::clone(&shared.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        tokio::spawn(run_job(Arc::clone(&shared), job, permit));
    }

    tracing::debug!("Job dispatcher stopped");
}

/// Delay before the attempt following failed attempt number `attempt`
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    Duration::from_millis(base_ms.saturating_mul(1u64 << exponent))
}

async fn run_job(shared: Arc<Shared>, mut job: ScrapeJob, first_permit: OwnedSemaphorePermit) {
    let counters = &shared.counters;
    let mut next_permit = Some(first_permit);

    loop {
        let permit = match next_permit.take() {
            Some(permit) => permit,
            None => match Arc::clone(&shared.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            },
        };

        let resuming = job.state == JobState::Retrying;
        let attempt = match job.begin_attempt() {
            Ok(attempt) => attempt,
            Err(e) => {
                tracing::error!("{}", e);
                shared.record_failure(&job, e.to_string());
                shared.finish_job();
                return;
            }
        };

        if resuming {
            counters.retrying.fetch_sub(1, Ordering::Relaxed);
        } else {
            counters.pending.fetch_sub(1, Ordering::Relaxed);
        }
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        tracing::debug!("Processing {} (attempt {})", job.target_url, attempt);

        // Run the processor in its own task so a panic only fails this attempt
        let processor = Arc::clone(&shared.processor);
        let attempt_job = job.clone();
        let outcome =
            match tokio::spawn(async move { processor.process(&attempt_job).await }).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) if e.is_panic() => Err("job processor panicked".to_string()),
                Err(e) => Err(e.to_string()),
            };

        counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        drop(permit);

        let error = match outcome {
            Ok(()) => {
                if let Err(e) = job.transition(JobState::Completed) {
                    tracing::error!("{}", e);
                }
                counters.completed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Completed {}", job.target_url);
                shared.finish_job();
                return;
            }
            Err(error) => error,
        };

        match job.fail_attempt(shared.config.max_attempts) {
            Ok(state) if !state.is_terminal() => {
                let delay = backoff_delay(shared.config.backoff_ms, attempt);
                tracing::warn!(
                    "Attempt {} for {} failed: {}; retrying in {:?}",
                    attempt,
                    job.target_url,
                    error,
                    delay
                );
                counters.retrying.fetch_add(1, Ordering::Relaxed);
                counters.retried.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(delay).await;
            }
            Ok(_) => {
                tracing::error!(
                    "Job for {} failed permanently after {} attempts: {}",
                    job.target_url,
                    job.attempt_count,
                    error
                );
                shared.record_failure(&job, error);
                shared.finish_job();
                return;
            }
            Err(e) => {
                tracing::error!("{}", e);
                shared.record_failure(&job, error);
                shared.finish_job();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MagpieError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn test_config(concurrency: usize, max_attempts: u32) -> QueueConfig {
        QueueConfig {
            concurrency,
            max_attempts,
            backoff_ms: 5,
            failure_history: 100,
        }
    }

    fn urls(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("https://ex.com/{}", i)).collect()
    }

    /// Sleeps briefly and tracks how many calls overlap
    #[derive(Default)]
    struct SlowProcessor {
        running: AtomicUsize,
        max_seen: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JobProcessor for SlowProcessor {
        async fn process(&self, _job: &ScrapeJob) -> Result<(), MagpieError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails each URL's first attempt, then succeeds
    #[derive(Default)]
    struct FlakyProcessor {
        attempts: Mutex<HashMap<String, u32>>,
    }

    #[async_trait]
    impl JobProcessor for FlakyProcessor {
        async fn process(&self, job: &ScrapeJob) -> Result<(), MagpieError> {
            let mut attempts = self.attempts.lock().unwrap();
            let seen = attempts.entry(job.target_url.clone()).or_insert(0);
            *seen += 1;
            if *seen == 1 {
                Err(MagpieError::TaskFailed("first attempt fails".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct FailingProcessor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JobProcessor for FailingProcessor {
        async fn process(&self, _job: &ScrapeJob) -> Result<(), MagpieError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(MagpieError::TaskFailed("always fails".to_string()))
        }
    }

    struct PanickyProcessor;

    #[async_trait]
    impl JobProcessor for PanickyProcessor {
        async fn process(&self, job: &ScrapeJob) -> Result<(), MagpieError> {
            if job.target_url.contains("boom") {
                panic!("processor blew up");
            }
            Ok(())
        }
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(1000, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1000, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(1000, 3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(0, 5), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_submit_returns_job_count() {
        let queue = JobQueue::start(test_config(4, 1), Arc::new(SlowProcessor::default()));

        let dupes = vec!["https://a.com".to_string(), "https://a.com".to_string()];
        assert_eq!(queue.submit(dupes).unwrap(), 2);
        assert_eq!(queue.submit(Vec::new()).unwrap(), 0);

        queue.wait_idle().await;
        assert_eq!(queue.snapshot().completed, 2);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let processor = Arc::new(SlowProcessor::default());
        let queue = JobQueue::start(test_config(3, 1), processor.clone());

        queue.submit(urls(20)).unwrap();
        queue.wait_idle().await;

        let snapshot = queue.snapshot();
        assert_eq!(processor.calls.load(Ordering::SeqCst), 20);
        assert!(processor.max_seen.load(Ordering::SeqCst) <= 3);
        assert!(snapshot.peak_in_flight <= 3);
        assert_eq!(snapshot.completed, 20);
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.pending, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded_multi_thread() {
        let processor = Arc::new(SlowProcessor::default());
        let queue = JobQueue::start(test_config(5, 1), processor.clone());

        queue.submit(urls(40)).unwrap();
        queue.wait_idle().await;

        assert!(processor.max_seen.load(Ordering::SeqCst) <= 5);
        assert_eq!(queue.snapshot().completed, 40);
    }

    #[tokio::test]
    async fn test_failed_job_is_retried() {
        let queue = JobQueue::start(test_config(2, 2), Arc::new(FlakyProcessor::default()));

        queue.submit(urls(3)).unwrap();
        queue.wait_idle().await;

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.completed, 3);
        assert_eq!(snapshot.retried, 3);
        assert_eq!(snapshot.failed, 0);
        assert_eq!(snapshot.retrying, 0);
        assert!(queue.recent_failures().is_empty());
    }

    #[tokio::test]
    async fn test_permanent_failure_after_max_attempts() {
        let processor = Arc::new(FailingProcessor::default());
        let queue = JobQueue::start(test_config(2, 2), processor.clone());

        queue.submit(vec!["https://down.example".to_string()]).unwrap();
        queue.wait_idle().await;

        assert_eq!(processor.calls.load(Ordering::SeqCst), 2);

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.completed, 0);

        let failures = queue.recent_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].url, "https://down.example");
        assert_eq!(failures[0].attempts, 2);
        assert!(failures[0].error.contains("always fails"));
    }

    #[tokio::test]
    async fn test_failure_history_is_bounded() {
        let config = QueueConfig {
            failure_history: 3,
            ..test_config(1, 1)
        };
        let queue = JobQueue::start(config, Arc::new(FailingProcessor::default()));

        queue.submit(urls(5)).unwrap();
        queue.wait_idle().await;

        assert_eq!(queue.snapshot().failed, 5);
        let failures = queue.recent_failures();
        assert_eq!(failures.len(), 3);
        // With one worker the jobs fail in order; the oldest are evicted
        assert_eq!(failures[2].url, "https://ex.com/4");
    }

    #[tokio::test]
    async fn test_panic_fails_only_that_job() {
        let queue = JobQueue::start(test_config(2, 2), Arc::new(PanickyProcessor));

        queue
            .submit(vec![
                "https://ok.com/1".to_string(),
                "https://boom.com".to_string(),
                "https://ok.com/2".to_string(),
            ])
            .unwrap();
        queue.wait_idle().await;

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.completed, 2);
        assert_eq!(snapshot.failed, 1);

        let failures = queue.recent_failures();
        assert_eq!(failures[0].url, "https://boom.com");
        assert!(failures[0].error.contains("panicked"));

        // The pool keeps working afterwards
        queue.submit(vec!["https://ok.com/3".to_string()]).unwrap();
        queue.wait_idle().await;
        assert_eq!(queue.snapshot().completed, 3);
    }

    #[tokio::test]
    async fn test_wait_idle_with_nothing_submitted() {
        let queue = JobQueue::start(test_config(1, 1), Arc::new(SlowProcessor::default()));
        queue.wait_idle().await;
        assert_eq!(queue.outstanding(), 0);
    }
}
