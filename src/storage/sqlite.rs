//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the MediaStore trait.

use crate::storage::schema::{get_schema_version, initialize_schema, search_text};
use crate::storage::traits::{MediaStore, StorageError, StorageResult};
use crate::storage::{MediaItem, MediaQuery, MediaStats, MediaType, NewMediaItem};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const INSERT_SQL: &str = "INSERT OR IGNORE INTO media
     (source_url, media_url, media_type, alt_text, title, created_at, search_text)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// Shared filter for the count and page queries: ?1 is the media type,
/// ?2 the lowercased LIKE pattern; either may be NULL to disable that filter
const FILTER_SQL: &str = r"
    WHERE (?1 IS NULL OR media_type = ?1)
      AND (?2 IS NULL OR search_text LIKE ?2 ESCAPE '\')";

/// SQLite storage backend
///
/// A single connection behind a mutex; callers on an async runtime should
/// reach it through `spawn_blocking`.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates a database file and applies the schema
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        tracing::debug!(
            "Opened media database {} (schema v{})",
            path.display(),
            get_schema_version(&conn)?
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl MediaStore for SqliteStorage {
    fn bulk_insert(&self, items: &[NewMediaItem]) -> StorageResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare_cached(INSERT_SQL)?;
            for item in items {
                inserted += stmt.execute(params![
                    item.source_url,
                    item.media_url,
                    item.media_type.to_db_string(),
                    item.alt_text,
                    item.title,
                    timestamp_now(),
                    search_text(
                        item.alt_text.as_deref(),
                        &item.title,
                        &item.source_url,
                        &item.media_url,
                    ),
                ])?;
            }
        }

        tx.commit()?;

        tracing::debug!(
            "Stored {} of {} media items ({} already known)",
            inserted,
            items.len(),
            items.len() - inserted
        );

        Ok(inserted)
    }

    fn query(&self, query: &MediaQuery) -> StorageResult<(Vec<MediaItem>, u64)> {
        let query = query.normalized();
        let media_type = query.media_type.map(|t| t.to_db_string());
        let pattern = query.search.as_deref().map(like_pattern);
        let limit = i64::from(query.limit);
        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

        let conn = self.lock()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM media {}", FILTER_SQL),
            params![media_type, pattern],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT id, source_url, media_url, media_type, alt_text, title, created_at
             FROM media {}
             ORDER BY created_at DESC, id DESC
             LIMIT ?3 OFFSET ?4",
            FILTER_SQL
        ))?;

        let items = stmt
            .query_map(params![media_type, pattern, limit, offset], row_to_media)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total as u64))
    }

    fn stats(&self) -> StorageResult<MediaStats> {
        let conn = self.lock()?;

        let stats = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(media_type = 'image'), 0),
                    COALESCE(SUM(media_type = 'video'), 0)
             FROM media",
            [],
            |row| {
                Ok(MediaStats {
                    total: row.get::<_, i64>(0)? as u64,
                    images: row.get::<_, i64>(1)? as u64,
                    videos: row.get::<_, i64>(2)? as u64,
                })
            },
        )?;

        Ok(stats)
    }
}

/// Fixed-width UTC timestamp; sorts lexicographically in time order
fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Wraps a lowercased search term for a substring LIKE, escaping LIKE wildcards
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn row_to_media(row: &Row<'_>) -> rusqlite::Result<MediaItem> {
    let media_type: String = row.get(3)?;
    let media_type = MediaType::from_db_string(&media_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown media type '{}'", media_type).into(),
        )
    })?;

    let created_at: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    Ok(MediaItem {
        id: row.get(0)?,
        source_url: row.get(1)?,
        media_url: row.get(2)?,
        media_type,
        alt_text: row.get(4)?,
        title: row.get(5)?,
        created_at,
    })
}
