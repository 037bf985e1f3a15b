//! Integration tests for the scrape pipeline
//!
//! These tests use wiremock to serve pages and run submissions through the
//! service, queue, fetcher, extractor and SQLite store end-to-end.

use magpie::config::{Config, QueueConfig, StorageConfig};
use magpie::storage::{MediaStore, SqliteStorage};
use magpie::{MediaQuery, MediaService, MediaType};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GALLERY_HTML: &str = r#"
<html>
  <body>
    <img src="/photos/beach-sunset.jpg" alt="">
    <img src="/photos/a.jpg" alt="cat photo" title="My Cat">
    <img src="data:image/png;base64,iVBORw0KGgo=">
    <img src="/logo.svg">
    <figure>
      <img src="/photos/0001.jpg">
      <figcaption>Harbour at dawn</figcaption>
    </figure>
    <video src="/clips/waves.mp4"></video>
    <iframe src="https://youtube.com/embed/abc12345"></iframe>
    <iframe src="https://ads.example.net/frame"></iframe>
  </body>
</html>
"#;

/// Creates a test configuration with a short backoff
fn create_test_config(database_path: &str) -> Config {
    Config {
        queue: QueueConfig {
            concurrency: 4,
            max_attempts: 2,
            backoff_ms: 10,
            failure_history: 10,
        },
        storage: StorageConfig {
            database_path: database_path.to_string(),
        },
        ..Config::default()
    }
}

fn in_memory_service() -> MediaService {
    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    MediaService::with_store(&create_test_config(":memory:"), store).unwrap()
}

async fn mount_page(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_gallery_page_end_to_end() {
    let server = MockServer::start().await;
    mount_page(&server, "/gallery", 200, GALLERY_HTML).await;

    let service = in_memory_service();
    let page_url = format!("{}/gallery", server.uri());

    let receipt = service.submit_urls(&[page_url.clone()]).unwrap();
    assert_eq!(receipt.job_count, 1);
    service.queue().wait_idle().await;

    let stats = service.get_stats().await.unwrap();
    assert_eq!(stats.images, 3);
    assert_eq!(stats.videos, 2);
    assert_eq!(stats.total, 5);

    let page = service.list_media(MediaQuery::default()).await.unwrap();
    assert_eq!(page.meta.total, 5);
    assert!(page.data.iter().all(|m| m.source_url == page_url));
    assert!(page.data.iter().all(|m| !m.title.trim().is_empty()));
    assert!(page
        .data
        .iter()
        .all(|m| !m.media_url.starts_with("data:") && !m.media_url.ends_with(".svg")));

    let title_of = |suffix: &str| {
        page.data
            .iter()
            .find(|m| m.media_url.ends_with(suffix))
            .map(|m| m.title.clone())
            .unwrap()
    };
    assert_eq!(title_of("/photos/a.jpg"), "My Cat");
    assert_eq!(title_of("/photos/beach-sunset.jpg"), "Beach Sunset");
    assert_eq!(title_of("/photos/0001.jpg"), "Harbour at dawn");
    assert!(title_of("abc12345").contains("YouTube Video"));
}

#[tokio::test]
async fn test_same_url_twice_stores_media_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<img src="/a.jpg"><img src="/b.jpg">"#),
        )
        .expect(2)
        .mount(&server)
        .await;

    let service = in_memory_service();
    let url = server.uri();

    let receipt = service.submit_urls(&[url.clone(), url]).unwrap();
    assert_eq!(receipt.job_count, 2);
    service.queue().wait_idle().await;

    assert_eq!(service.queue().snapshot().completed, 2);
    assert_eq!(service.get_stats().await.unwrap().total, 2);
}

#[tokio::test]
async fn test_shared_media_across_pages_is_deduplicated() {
    let server = MockServer::start().await;
    let shared = r#"<img src="https://cdn.example.com/shared.jpg" alt="shared">"#;
    for page in 0..6 {
        let body = format!(r#"{}<img src="/own-{}.jpg">"#, shared, page);
        mount_page(&server, &format!("/p{}", page), 200, &body).await;
    }

    let service = in_memory_service();
    let urls: Vec<String> = (0..6).map(|p| format!("{}/p{}", server.uri(), p)).collect();
    service.submit_urls(&urls).unwrap();
    service.queue().wait_idle().await;

    let stats = service.get_stats().await.unwrap();
    assert_eq!(stats.total, 7);

    let search = service
        .list_media(MediaQuery {
            search: Some("shared".to_string()),
            ..MediaQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(search.meta.total, 1);
}

#[tokio::test]
async fn test_failing_page_is_retried_then_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/fine", 200, r#"<img src="/ok.jpg">"#).await;

    let service = in_memory_service();
    let broken = format!("{}/broken", server.uri());
    service
        .submit_urls(&[broken.clone(), format!("{}/fine", server.uri())])
        .unwrap();
    service.queue().wait_idle().await;

    let snapshot = service.queue().snapshot();
    assert_eq!(snapshot.completed, 1);
    assert_eq!(snapshot.failed, 1);
    assert_eq!(snapshot.retried, 1);

    let failures = service.queue().recent_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].url, broken);
    assert_eq!(failures[0].attempts, 2);
    assert!(failures[0].error.contains("500"));

    // The healthy page is unaffected
    assert_eq!(service.get_stats().await.unwrap().total, 1);
}

#[tokio::test]
async fn test_page_without_media_completes() {
    let server = MockServer::start().await;
    mount_page(&server, "/", 200, "<html><body><p>Just text</p></body></html>").await;

    let service = in_memory_service();
    service.submit_urls(&[server.uri()]).unwrap();
    service.queue().wait_idle().await;

    let snapshot = service.queue().snapshot();
    assert_eq!(snapshot.completed, 1);
    assert_eq!(snapshot.failed, 0);
    assert_eq!(service.get_stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn test_listing_filters_and_pages() {
    let server = MockServer::start().await;
    let mut body = String::new();
    for i in 0..25 {
        body.push_str(&format!(r#"<img src="/img/{}.jpg">"#, i));
    }
    body.push_str(r#"<video src="/v/clip.mp4"></video>"#);
    mount_page(&server, "/", 200, &body).await;

    let service = in_memory_service();
    service.submit_urls(&[server.uri()]).unwrap();
    service.queue().wait_idle().await;

    let images = service
        .list_media(MediaQuery {
            page: 2,
            limit: 20,
            media_type: Some(MediaType::Image),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(images.data.len(), 5);
    assert_eq!(images.meta.total, 25);
    assert_eq!(images.meta.total_pages, 2);
    assert!(images.data.iter().all(|m| m.media_type == MediaType::Image));

    let videos = service
        .list_media(MediaQuery {
            media_type: Some(MediaType::Video),
            ..MediaQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(videos.meta.total, 1);
    assert_eq!(videos.data[0].alt_text, None);
}

#[tokio::test]
async fn test_invalid_submission_never_queued() {
    let service = in_memory_service();

    assert!(service.submit_urls(&[]).is_err());
    assert!(service
        .submit_urls(&["ftp://files.example.com/".to_string()])
        .is_err());

    assert_eq!(service.queue().snapshot().pending, 0);
    assert_eq!(service.queue().outstanding(), 0);
}

#[tokio::test]
async fn test_results_persist_in_database_file() {
    let server = MockServer::start().await;
    mount_page(&server, "/", 200, r#"<img src="/kept.jpg" alt="kept">"#).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("magpie.db");
    let config = create_test_config(db_path.to_str().unwrap());

    {
        let service = MediaService::start(&config).unwrap();
        service.submit_urls(&[server.uri()]).unwrap();
        service.queue().wait_idle().await;
    }

    let reopened = SqliteStorage::new(&db_path).unwrap();
    let stats = reopened.stats().unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.images, 1);
}
