//! HTTP fetcher implementation
//!
//! This module handles page requests for the scrape jobs, including:
//! - Building one pooled HTTP client with browser-like default headers
//! - GET requests with a bounded redirect chain
//! - Error classification into typed `FetchError` values

use crate::config::FetcherConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Too many redirects fetching {url}")]
    TooManyRedirects { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid value for header {0}")]
    InvalidHeader(&'static str),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    fn classify(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_redirect() {
            Self::TooManyRedirects { url }
        } else {
            Self::Http { url, source: error }
        }
    }
}

/// Builds the shared HTTP client
///
/// The client carries the configured `User-Agent`, `Accept` and
/// `Accept-Language` headers on every request and keeps idle connections
/// alive per host, so one instance should be built at startup and reused.
///
/// # Example
///
/// ```
/// use magpie::config::FetcherConfig;
/// use magpie::scrape::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_str(&config.accept).map_err(|_| FetchError::InvalidHeader("accept"))?,
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language)
            .map_err(|_| FetchError::InvalidHeader("accept-language"))?,
    );

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_millis(config.timeout_ms))
        .redirect(Policy::limited(config.max_redirects))
        .pool_max_idle_per_host(config.max_idle_per_host)
        .tcp_keepalive(Duration::from_secs(60))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(FetchError::Client)
}

/// A fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after following redirects; relative media resolve against it
    pub final_url: String,
    pub body: String,
}

/// Page fetcher wrapping a shared HTTP client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with its own client from configuration
    pub fn from_config(config: &FetcherConfig) -> Result<Self, FetchError> {
        Ok(Self::new(build_http_client(config)?))
    }

    /// Fetches a page and returns its body as text along with its final URL
    ///
    /// Redirects are followed up to the client's limit. Only a final status
    /// in the 2xx-3xx range counts as success; everything else, including
    /// network errors and body decode failures, comes back as a `FetchError`.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::classify(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !(status.is_success() || status.is_redirection()) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::classify(url, e))?;

        tracing::debug!("Fetched {} ({}, {} bytes)", final_url, status, body.len());
        Ok(FetchedPage { final_url, body })
    }
}
