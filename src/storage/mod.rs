//! Storage module for persisting extracted media
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Skip-on-conflict bulk inserts keyed on the media URL
//! - Filtered, paginated queries ordered newest first
//! - Aggregate counts by media type

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{MediaStore, StorageError, StorageResult};

use crate::extract::CandidateMedia;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default page size for media queries
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a query may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Opens (or creates) the SQLite media store at the given path
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Kind of media reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_string(&s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown media type '{}', expected 'image' or 'video'", s))
    }
}

/// A stored, deduplicated media record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: i64,
    pub source_url: String,
    pub media_url: String,
    pub media_type: MediaType,
    pub alt_text: Option<String>,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A media record waiting to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMediaItem {
    pub source_url: String,
    pub media_url: String,
    pub media_type: MediaType,
    pub alt_text: Option<String>,
    pub title: String,
}

impl NewMediaItem {
    /// Attaches the page URL to an extracted candidate
    pub fn from_candidate(source_url: &str, candidate: CandidateMedia) -> Self {
        Self {
            source_url: source_url.to_string(),
            media_url: candidate.media_url,
            media_type: candidate.media_type,
            alt_text: candidate.alt_text,
            title: candidate.title,
        }
    }
}

/// Filters and pagination for a media listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    /// 1-based page number
    pub page: u32,

    /// Items per page
    pub limit: u32,

    /// Exact media type filter
    pub media_type: Option<MediaType>,

    /// Case-insensitive substring matched against alt text, title,
    /// source URL and media URL
    pub search: Option<String>,
}

impl Default for MediaQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            media_type: None,
            search: None,
        }
    }
}

impl MediaQuery {
    /// Clamps page to at least 1 and limit to `1..=MAX_PAGE_SIZE`, and drops
    /// a blank search term
    pub fn normalized(&self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
            media_type: self.media_type,
            search: self
                .search
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    /// Number of rows skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Pagination metadata returned with a page of media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(total: u64, page: u32, limit: u32) -> Self {
        let limit_wide = u64::from(limit.max(1));
        Self {
            total,
            page,
            limit,
            total_pages: (total + limit_wide - 1) / limit_wide,
        }
    }
}

/// One page of media plus pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPage {
    pub data: Vec<MediaItem>,
    pub meta: PageMeta,
}

/// Aggregate media counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MediaStats {
    pub total: u64,
    pub images: u64,
    pub videos: u64,
}
