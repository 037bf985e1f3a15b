//! Media extraction from HTML documents
//!
//! This module turns one HTML page into a list of candidate media:
//! - `<img>` elements
//! - `<video>` elements and their nested `<source>` elements
//! - `<iframe>` embeds from YouTube, Vimeo and Dailymotion
//!
//! Sources are filtered (`data:` URIs and SVGs are dropped), resolved against
//! the page URL and given a title by the cascades in [`title`]. Extraction is
//! a pure function: no I/O, no shared state, and malformed markup is parsed
//! leniently rather than rejected.

mod filename;
mod platform;
pub mod title;

pub use filename::clean_filename;
pub use platform::{embed_title, is_embed_url, VideoPlatform, EMBED_HOSTS};

use crate::storage::MediaType;
use crate::url::{is_acceptable_source, normalize};
use scraper::{ElementRef, Html, Selector};
use title::{
    infer_title, TitleContext, TitleRule, EMBED_FALLBACK, EMBED_RULES, IMAGE_FALLBACK,
    IMAGE_RULES, VIDEO_FALLBACK, VIDEO_RULES,
};

/// A media reference found on a page, before deduplication and storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMedia {
    /// Absolute media URL
    pub media_url: String,

    pub media_type: MediaType,

    /// Raw `alt` attribute for images (empty if absent); `None` for video
    pub alt_text: Option<String>,

    /// Inferred title; never empty
    pub title: String,
}

/// Extracts every qualifying image, video and embed from an HTML document
///
/// Candidates come back grouped by kind (images, then videos, then embeds)
/// and in document order within each group. The list is not deduplicated.
///
/// # Arguments
///
/// * `html` - The page HTML; may be malformed
/// * `base_url` - The page URL, used to resolve relative sources
///
/// # Example
///
/// ```
/// use magpie::extract;
///
/// let html = r#"<img src="/a.jpg" alt="cat photo" title="My Cat">"#;
/// let media = extract(html, "https://ex.com/page");
/// assert_eq!(media.len(), 1);
/// assert_eq!(media[0].media_url, "https://ex.com/a.jpg");
/// assert_eq!(media[0].title, "My Cat");
/// ```
pub fn extract(html: &str, base_url: &str) -> Vec<CandidateMedia> {
    let document = Html::parse_document(html);

    let mut media = Vec::new();
    collect_images(&document, base_url, &mut media);
    collect_videos(&document, base_url, &mut media);
    collect_embeds(&document, base_url, &mut media);

    tracing::trace!("Extracted {} media candidates from {}", media.len(), base_url);
    media
}

/// Filters and resolves a raw source attribute
fn resolve_source(src: &str, base_url: &str) -> Option<String> {
    if !is_acceptable_source(src) {
        tracing::trace!("Skipping media source {:?}", src);
        return None;
    }
    Some(normalize(src, base_url))
}

fn titled(
    element: ElementRef<'_>,
    media_url: &str,
    rules: &[TitleRule],
    fallback: &str,
) -> String {
    let ctx = TitleContext { element, media_url };
    infer_title(rules, &ctx, fallback)
}

fn collect_images(document: &Html, base_url: &str, media: &mut Vec<CandidateMedia>) {
    let Ok(img_selector) = Selector::parse("img[src]") else {
        return;
    };

    for img in document.select(&img_selector) {
        let Some(media_url) = img
            .value()
            .attr("src")
            .and_then(|src| resolve_source(src, base_url))
        else {
            continue;
        };

        let title = titled(img, &media_url, IMAGE_RULES, IMAGE_FALLBACK);
        let alt_text = img.value().attr("alt").unwrap_or_default().to_string();

        media.push(CandidateMedia {
            media_url,
            media_type: MediaType::Image,
            alt_text: Some(alt_text),
            title,
        });
    }
}

fn collect_videos(document: &Html, base_url: &str, media: &mut Vec<CandidateMedia>) {
    let (Ok(video_selector), Ok(source_selector)) =
        (Selector::parse("video"), Selector::parse("source[src]"))
    else {
        return;
    };

    for video in document.select(&video_selector) {
        let own_source = video.value().attr("src");
        let nested_sources = video
            .select(&source_selector)
            .filter_map(|source| source.value().attr("src"));

        // Nested <source> elements are titled from their <video>
        for src in own_source.into_iter().chain(nested_sources) {
            let Some(media_url) = resolve_source(src, base_url) else {
                continue;
            };

            let title = titled(video, &media_url, VIDEO_RULES, VIDEO_FALLBACK);
            media.push(CandidateMedia {
                media_url,
                media_type: MediaType::Video,
                alt_text: None,
                title,
            });
        }
    }
}

fn collect_embeds(document: &Html, base_url: &str, media: &mut Vec<CandidateMedia>) {
    let Ok(iframe_selector) = Selector::parse("iframe[src]") else {
        return;
    };

    for iframe in document.select(&iframe_selector) {
        let Some(media_url) = iframe
            .value()
            .attr("src")
            .and_then(|src| resolve_source(src, base_url))
        else {
            continue;
        };

        if !is_embed_url(&media_url) {
            continue;
        }

        let title = titled(iframe, &media_url, EMBED_RULES, EMBED_FALLBACK);
        media.push(CandidateMedia {
            media_url,
            media_type: MediaType::Video,
            alt_text: None,
            title,
        });
    }
}
