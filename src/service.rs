//! Orchestration service
//!
//! [`MediaService`] is the single entry point a transport layer talks to:
//! it validates and queues submissions, and answers listing and stats
//! queries against the store.

use crate::config::Config;
use crate::queue::JobQueue;
use crate::scrape::{Fetcher, ScrapeProcessor};
use crate::storage::{open_storage, MediaPage, MediaQuery, MediaStats, MediaStore, PageMeta};
use crate::url::validate_submission_urls;
use crate::{MagpieError, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Acknowledgement returned for a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub message: String,
    pub job_count: usize,
}

/// Ties the job queue to the media store
pub struct MediaService {
    queue: JobQueue,
    store: Arc<dyn MediaStore>,
}

impl MediaService {
    /// Opens the configured database and starts the worker pool
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: &Config) -> Result<Self> {
        let store = open_storage(Path::new(&config.storage.database_path))?;
        tracing::info!("Media store opened at {}", config.storage.database_path);
        Self::with_store(config, Arc::new(store))
    }

    /// Starts the worker pool against an already opened store
    pub fn with_store(config: &Config, store: Arc<dyn MediaStore>) -> Result<Self> {
        let fetcher = Fetcher::from_config(&config.fetcher)?;
        let processor = ScrapeProcessor::new(fetcher, Arc::clone(&store));
        let queue = JobQueue::start(config.queue.clone(), Arc::new(processor));

        Ok(Self { queue, store })
    }

    /// Validates and queues page URLs for scraping
    ///
    /// Returns as soon as the jobs are queued. Every URL becomes its own
    /// job, duplicates included; one malformed URL rejects the whole batch.
    pub fn submit_urls(&self, urls: &[String]) -> Result<SubmitReceipt> {
        validate_submission_urls(urls)?;

        let urls: Vec<String> = urls.iter().map(|url| url.trim().to_string()).collect();
        let job_count = self.queue.submit(urls)?;

        tracing::info!("Accepted {} URLs for scraping", job_count);

        Ok(SubmitReceipt {
            message: format!("Queued {} URL(s) for scraping", job_count),
            job_count,
        })
    }

    /// Returns one page of stored media, newest first
    pub async fn list_media(&self, query: MediaQuery) -> Result<MediaPage> {
        let query = query.normalized();
        let store = Arc::clone(&self.store);
        let lookup = query.clone();

        let (data, total) = tokio::task::spawn_blocking(move || store.query(&lookup))
            .await
            .map_err(|e| MagpieError::TaskFailed(e.to_string()))??;

        Ok(MediaPage {
            data,
            meta: PageMeta::new(total, query.page, query.limit),
        })
    }

    /// Counts stored media in total and per type
    pub async fn get_stats(&self) -> Result<MediaStats> {
        let store = Arc::clone(&self.store);
        let stats = tokio::task::spawn_blocking(move || store.stats())
            .await
            .map_err(|e| MagpieError::TaskFailed(e.to_string()))??;
        Ok(stats)
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }
}
