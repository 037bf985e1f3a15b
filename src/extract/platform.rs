//! Video hosting platforms recognised in embed and video URLs

use crate::url::{extract_host, host_matches_any};
use url::Url;

/// Hosts whose iframes are collected as video embeds
pub const EMBED_HOSTS: &[&str] = &["youtube.com", "vimeo.com", "dailymotion.com"];

/// A known video hosting platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPlatform {
    YouTube,
    Vimeo,
    Dailymotion,
}

impl VideoPlatform {
    /// Detects the platform from a media URL's host
    pub fn from_url(url: &str) -> Option<Self> {
        let host = extract_host(url)?;
        if host.contains("youtube.com") || host.contains("youtu.be") {
            Some(Self::YouTube)
        } else if host.contains("vimeo.com") {
            Some(Self::Vimeo)
        } else if host.contains("dailymotion.com") {
            Some(Self::Dailymotion)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Vimeo => "Vimeo",
            Self::Dailymotion => "Dailymotion",
        }
    }

    /// Generic title used when nothing better is known
    pub fn default_title(&self) -> String {
        format!("{} Video", self.name())
    }
}

/// Returns true if an iframe source points at a supported embed host
pub fn is_embed_url(url: &str) -> bool {
    host_matches_any(url, EMBED_HOSTS)
}

/// Derives a title from an embed URL
///
/// Prefers a `title` query parameter that reads as text; otherwise
/// synthesizes `"<Platform> Video (<id>)"` from the last path segment.
/// Numeric values such as Vimeo's `title=0` player flag are not titles.
pub fn embed_title(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;

    let from_query = parsed
        .query_pairs()
        .find(|(key, _)| key == "title")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty() && !value.chars().all(|c| c.is_ascii_digit()));
    if from_query.is_some() {
        return from_query;
    }

    let platform = VideoPlatform::from_url(url)?;
    let id = parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;

    Some(format!("{} ({})", platform.default_title(), id))
}
