//! Storage traits and error types
//!
//! This module defines the trait interface for media store backends and
//! associated error types.

use crate::storage::{MediaItem, MediaQuery, MediaStats, NewMediaItem};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for media store implementations
///
/// Implementations must be safe to share between worker tasks: concurrent
/// `bulk_insert` calls that carry the same media URL must leave exactly one
/// row for it, enforced by the store itself rather than a read-then-write.
pub trait MediaStore: Send + Sync {
    /// Inserts media, silently skipping any whose media URL is already stored
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    fn bulk_insert(&self, items: &[NewMediaItem]) -> StorageResult<usize>;

    /// Returns one page of media matching the query, newest first, along
    /// with the total number of matching rows
    ///
    /// The query is normalized (page and limit clamped) before use.
    fn query(&self, query: &MediaQuery) -> StorageResult<(Vec<MediaItem>, u64)>;

    /// Counts stored media in total and per type
    fn stats(&self) -> StorageResult<MediaStats>;
}
