//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Content-Audit
//! database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track batch runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    mapping_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    processed_count INTEGER NOT NULL DEFAULT 0,
    failed_count INTEGER NOT NULL DEFAULT 0
);

-- URLs whose pipeline completed; a resumed batch skips these
CREATE TABLE IF NOT EXISTS processed_urls (
    url TEXT PRIMARY KEY,
    processed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS page_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    title TEXT,
    screenshot_url TEXT,
    audited_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS content_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    block_name TEXT NOT NULL,
    instance_id TEXT NOT NULL,
    component_name TEXT NOT NULL,
    value TEXT NOT NULL,
    source_element_tag TEXT NOT NULL,
    css_classes TEXT NOT NULL,
    readability_score REAL,
    grade_level REAL
);

CREATE INDEX IF NOT EXISTS idx_content_rows_url ON content_rows(url);

CREATE TABLE IF NOT EXISTS asset_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_page_url TEXT NOT NULL,
    asset_url TEXT NOT NULL,
    asset_type TEXT NOT NULL,
    link_text TEXT NOT NULL,
    file_size TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_asset_rows_page ON asset_rows(source_page_url);

-- Only non-OK link checks are stored
CREATE TABLE IF NOT EXISTS link_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_page_url TEXT NOT NULL,
    linked_url TEXT NOT NULL,
    status TEXT NOT NULL,
    block_name TEXT,
    component_name TEXT
);

CREATE INDEX IF NOT EXISTS idx_link_rows_page ON link_rows(source_page_url);

-- Latest failure per URL still awaiting a successful retry
CREATE TABLE IF NOT EXISTS failures (
    url TEXT PRIMARY KEY,
    error TEXT NOT NULL,
    failed_at TEXT NOT NULL
);
"#;

/// Tables cleared by an explicit batch reset; run history is kept
pub const BATCH_TABLES: &[&str] = &[
    "processed_urls",
    "page_rows",
    "content_rows",
    "asset_rows",
    "link_rows",
    "failures",
];

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in std::iter::once(&"runs").chain(BATCH_TABLES) {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
