//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{
    AssetRow, BatchState, BatchStatus, ContentRow, FileSize, LinkStatus, LinkStatusRow, PageAudit,
    PageRow, UrlFailure,
};
use crate::storage::schema::{initialize_schema, BATCH_TABLES};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::RunRecord;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn load_page_rows(&self) -> StorageResult<Vec<PageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, title, screenshot_url, audited_at FROM page_rows ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PageRow {
                    url: row.get(0)?,
                    title: row.get(1)?,
                    screenshot_url: row.get(2)?,
                    audited_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn load_content_rows(&self) -> StorageResult<Vec<ContentRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, block_name, instance_id, component_name, value, source_element_tag,
             css_classes, readability_score, grade_level
             FROM content_rows ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ContentRow {
                    url: row.get(0)?,
                    block_name: row.get(1)?,
                    instance_id: row.get(2)?,
                    component_name: row.get(3)?,
                    value: row.get(4)?,
                    source_element_tag: row.get(5)?,
                    css_classes: row.get(6)?,
                    readability_score: row.get(7)?,
                    grade_level: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn load_asset_rows(&self) -> StorageResult<Vec<AssetRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_page_url, asset_url, asset_type, link_text, file_size
             FROM asset_rows ORDER BY id",
        )?;

        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(source_page_url, asset_url, asset_type, link_text, file_size)| -> StorageResult<AssetRow> {
                    let file_size =
                        FileSize::parse(&file_size).ok_or(StorageError::CorruptValue {
                            table: "asset_rows",
                            value: file_size.clone(),
                        })?;
                    Ok(AssetRow {
                        source_page_url,
                        asset_url,
                        asset_type,
                        link_text,
                        file_size,
                    })
                },
            )
            .collect()
    }

    fn load_link_rows(&self) -> StorageResult<Vec<LinkStatusRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_page_url, linked_url, status, block_name, component_name
             FROM link_rows ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(LinkStatusRow {
                    source_page_url: row.get(0)?,
                    linked_url: row.get(1)?,
                    status: LinkStatus::parse(&row.get::<_, String>(2)?),
                    block_name: row.get(3)?,
                    component_name: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn load_failures(&self) -> StorageResult<Vec<UrlFailure>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, error FROM failures ORDER BY failed_at, url")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(UrlFailure {
                    url: row.get(0)?,
                    error: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        mapping_hash: row.get(3)?,
        status: BatchStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(BatchStatus::Running),
        processed_count: row.get::<_, i64>(5)? as usize,
        failed_count: row.get::<_, i64>(6)? as usize,
    })
}

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, mapping_hash, status, processed_count, failed_count";

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, mapping_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, mapping_hash, status) VALUES (?1, ?2, ?3)",
            params![now, mapping_hash, BatchStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: BatchStatus,
        processed: usize,
        failed: usize,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, processed_count = ?3, failed_count = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                processed as i64,
                failed as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Batch State =====

    fn load_batch_state(&self) -> StorageResult<BatchState> {
        let mut stmt = self.conn.prepare("SELECT url FROM processed_urls")?;
        let processed_urls: HashSet<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;

        let state = BatchState {
            processed_urls,
            page_rows: self.load_page_rows()?,
            content_rows: self.load_content_rows()?,
            asset_rows: self.load_asset_rows()?,
            link_rows: self.load_link_rows()?,
            failures: self.load_failures()?,
        };

        tracing::debug!(
            "Loaded batch state: {} processed URLs, {} content rows, {} failures",
            state.processed_urls.len(),
            state.content_rows.len(),
            state.failures.len()
        );

        Ok(state)
    }

    fn commit_page(&mut self, url: &str, audit: &PageAudit) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        if let Some(page) = &audit.page {
            tx.execute(
                "INSERT INTO page_rows (url, title, screenshot_url, audited_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![page.url, page.title, page.screenshot_url, page.audited_at],
            )?;
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO content_rows (url, block_name, instance_id, component_name, value,
                 source_element_tag, css_classes, readability_score, grade_level)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in &audit.content_rows {
                stmt.execute(params![
                    row.url,
                    row.block_name,
                    row.instance_id,
                    row.component_name,
                    row.value,
                    row.source_element_tag,
                    row.css_classes,
                    row.readability_score,
                    row.grade_level
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO asset_rows (source_page_url, asset_url, asset_type, link_text, file_size)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in &audit.asset_rows {
                stmt.execute(params![
                    row.source_page_url,
                    row.asset_url,
                    row.asset_type,
                    row.link_text,
                    row.file_size.to_string()
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO link_rows (source_page_url, linked_url, status, block_name, component_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in &audit.link_rows {
                stmt.execute(params![
                    row.source_page_url,
                    row.linked_url,
                    row.status.to_string(),
                    row.block_name,
                    row.component_name
                ])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO processed_urls (url, processed_at) VALUES (?1, ?2)",
            params![url, now],
        )?;
        tx.execute("DELETE FROM failures WHERE url = ?1", params![url])?;

        tx.commit()?;

        tracing::debug!(
            "Committed {}: {} content, {} assets, {} links",
            url,
            audit.content_rows.len(),
            audit.asset_rows.len(),
            audit.link_rows.len()
        );
        Ok(())
    }

    fn record_failure(&mut self, failure: &UrlFailure) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO failures (url, error, failed_at) VALUES (?1, ?2, ?3)",
            params![failure.url, failure.error, now],
        )?;
        Ok(())
    }

    fn count_processed(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM processed_urls", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn reset(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        for table in BATCH_TABLES {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }
        tx.commit()?;

        tracing::info!("Cleared persisted batch state");
        Ok(())
    }
}
