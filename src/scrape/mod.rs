//! Page scraping: fetch a page, extract its media, store the result
//!
//! [`Fetcher`] wraps the shared HTTP client; [`ScrapeProcessor`] is the
//! job processor the worker pool runs for every submitted URL.

mod fetcher;
mod processor;

pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use processor::ScrapeProcessor;
