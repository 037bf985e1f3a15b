//! Database schema definitions
//!
//! This module contains the SQL schema for the Magpie media database.

/// Current schema version, stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: u32 = 2;

/// SQL schema for the database
///
/// The UNIQUE constraint on `media_url` is what deduplicates media found by
/// concurrent jobs; inserts rely on it through `INSERT OR IGNORE`.
///
/// `search_text` holds the lowercased alt text, title and URLs. Searches
/// match against it because SQLite's `LIKE` only folds ASCII case.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_url TEXT NOT NULL,
    media_url TEXT NOT NULL UNIQUE,
    media_type TEXT NOT NULL CHECK (media_type IN ('image', 'video')),
    alt_text TEXT,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL,
    search_text TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_media_created_at ON media(created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_media_type_created_at ON media(media_type, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_media_source_url ON media(source_url);
"#;

/// Initializes the database schema
///
/// Safe to run against an existing database.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    if !has_column(conn, "media", "search_text")? {
        add_search_text(conn)?;
    }
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Builds the lowercased text that searches match against
pub fn search_text(
    alt_text: Option<&str>,
    title: &str,
    source_url: &str,
    media_url: &str,
) -> String {
    [alt_text.unwrap_or(""), title, source_url, media_url]
        .join("\n")
        .to_lowercase()
}

fn has_column(
    conn: &rusqlite::Connection,
    table: &str,
    column: &str,
) -> Result<bool, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name == column))
}

/// Upgrades a version 1 database: adds `search_text` and fills it in
fn add_search_text(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "ALTER TABLE media ADD COLUMN search_text TEXT NOT NULL DEFAULT ''",
        [],
    )?;

    let rows = {
        let mut stmt = tx.prepare("SELECT id, alt_text, title, source_url, media_url FROM media")?;
        let rows = stmt
            .query_map([], |row| {
                let alt_text: Option<String> = row.get(1)?;
                let title: String = row.get(2)?;
                let source_url: String = row.get(3)?;
                let media_url: String = row.get(4)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    search_text(alt_text.as_deref(), &title, &source_url, &media_url),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    {
        let mut update = tx.prepare("UPDATE media SET search_text = ?1 WHERE id = ?2")?;
        for (id, text) in &rows {
            update.execute(rusqlite::params![text, id])?;
        }
    }

    tx.commit()?;
    tracing::info!("Migrated media table: indexed {} rows for search", rows.len());
    Ok(())
}

/// Reads the schema version recorded in the database
pub fn get_schema_version(conn: &rusqlite::Connection) -> Result<u32, rusqlite::Error> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}
