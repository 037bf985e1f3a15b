//! Per-job pipeline: fetch, extract, persist

use crate::extract::{extract, CandidateMedia};
use crate::queue::{JobProcessor, ScrapeJob};
use crate::scrape::Fetcher;
use crate::storage::{MediaStore, NewMediaItem};
use crate::MagpieError;
use async_trait::async_trait;
use std::sync::Arc;

/// Job processor that scrapes one page into the media store
pub struct ScrapeProcessor {
    fetcher: Fetcher,
    store: Arc<dyn MediaStore>,
}

impl ScrapeProcessor {
    pub fn new(fetcher: Fetcher, store: Arc<dyn MediaStore>) -> Self {
        Self { fetcher, store }
    }
}

#[async_trait]
impl JobProcessor for ScrapeProcessor {
    /// A fetch or store failure fails the attempt. A page without media, or
    /// one whose extraction panics, still counts as success.
    async fn process(&self, job: &ScrapeJob) -> Result<(), MagpieError> {
        let url = job.target_url.as_str();

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                return Err(e.into());
            }
        };

        // Media resolve against where the page ended up; it is stored under
        // the submitted URL
        let candidates = extract_off_thread(page.body, page.final_url).await;
        if candidates.is_empty() {
            tracing::debug!("No media found on {}", url);
            return Ok(());
        }

        let found = candidates.len();
        let items: Vec<NewMediaItem> = candidates
            .into_iter()
            .map(|candidate| NewMediaItem::from_candidate(url, candidate))
            .collect();

        let store = Arc::clone(&self.store);
        let inserted = tokio::task::spawn_blocking(move || store.bulk_insert(&items))
            .await
            .map_err(|e| MagpieError::TaskFailed(e.to_string()))??;

        tracing::info!("Scraped {}: {} media found, {} new", url, found, inserted);
        Ok(())
    }
}

/// Runs extraction on the blocking pool; a panic yields no candidates
async fn extract_off_thread(html: String, base_url: String) -> Vec<CandidateMedia> {
    let page_url = base_url.clone();
    match tokio::task::spawn_blocking(move || extract(&html, &page_url)).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Media extraction failed for {}: {}", base_url, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetcherConfig;
    use crate::storage::{MediaQuery, MediaType, SqliteStorage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn processor_with_store() -> (ScrapeProcessor, Arc<SqliteStorage>) {
        let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
        let fetcher = Fetcher::from_config(&FetcherConfig::default()).unwrap();
        (ScrapeProcessor::new(fetcher, store.clone()), store)
    }

    async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_page_media_is_stored() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/gallery",
            200,
            r#"<html><body>
                <img src="/a.jpg" alt="cat photo" title="My Cat">
                <video src="/clip.mp4"></video>
                <iframe src="https://youtube.com/embed/abc12345"></iframe>
            </body></html>"#,
        )
        .await;

        let (processor, store) = processor_with_store();
        let page = format!("{}/gallery", server.uri());
        processor.process(&ScrapeJob::new(page.clone())).await.unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.images, 1);
        assert_eq!(stats.videos, 2);

        let (items, _) = store.query(&MediaQuery::default()).unwrap();
        assert!(items.iter().all(|m| m.source_url == page));
        let image = items
            .iter()
            .find(|m| m.media_type == MediaType::Image)
            .unwrap();
        assert_eq!(image.media_url, format!("{}/a.jpg", server.uri()));
        assert_eq!(image.title, "My Cat");
    }

    #[tokio::test]
    async fn test_relative_media_resolve_against_redirect_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blog"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/blog/"))
            .mount(&server)
            .await;
        serve(&server, "/blog/", 200, r#"<img src="cover.jpg" alt="cover">"#).await;

        let (processor, store) = processor_with_store();
        let submitted = format!("{}/blog", server.uri());
        processor.process(&ScrapeJob::new(submitted.clone())).await.unwrap();

        let (items, _) = store.query(&MediaQuery::default()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].media_url, format!("{}/blog/cover.jpg", server.uri()));
        assert_eq!(items[0].source_url, submitted);
    }

    #[tokio::test]
    async fn test_reprocessing_does_not_duplicate() {
        let server = MockServer::start().await;
        serve(&server, "/", 200, r#"<img src="/a.jpg"><img src="/a.jpg">"#).await;

        let (processor, store) = processor_with_store();
        let job = ScrapeJob::new(server.uri());
        processor.process(&job).await.unwrap();
        processor.process(&job).await.unwrap();

        assert_eq!(store.stats().unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_page_without_media_succeeds() {
        let server = MockServer::start().await;
        serve(&server, "/", 200, "<html><p>nothing to see</p></html>").await;

        let (processor, store) = processor_with_store();
        assert!(processor.process(&ScrapeJob::new(server.uri())).await.is_ok());
        assert_eq!(store.stats().unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_attempt() {
        let server = MockServer::start().await;
        serve(&server, "/", 500, "oops").await;

        let (processor, store) = processor_with_store();
        let result = processor.process(&ScrapeJob::new(server.uri())).await;

        assert!(matches!(result, Err(MagpieError::Fetch(_))));
        assert_eq!(store.stats().unwrap().total, 0);
    }
}
