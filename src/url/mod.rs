//! URL handling module for Magpie
//!
//! This module provides media source filtering, normalization against a page
//! URL, host extraction, and validation of URLs submitted for scraping.

mod domain;
mod normalize;

use crate::{UrlError, UrlResult};
use ::url::Url;

// Re-export main functions
pub use domain::{extract_host, host_matches_any};
pub use normalize::{is_acceptable_source, normalize};

/// Validates one URL submitted for scraping
///
/// The URL must parse as an absolute `http` or `https` URL with a host.
pub fn validate_submission_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS URLs can be scraped, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(raw.to_string()));
    }

    Ok(url)
}

/// Validates a batch of submitted URLs
///
/// The batch must be non-empty and every entry well-formed; the first bad
/// entry rejects the whole batch so nothing half-valid reaches the queue.
pub fn validate_submission_urls(urls: &[String]) -> UrlResult<()> {
    if urls.is_empty() {
        return Err(UrlError::Empty);
    }

    for raw in urls {
        validate_submission_url(raw)?;
    }

    Ok(())
}
