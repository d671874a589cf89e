//! Local archive queue database.
//!
//! This module provides SQLite database connectivity with:
//! - Connection pool management
//! - WAL mode for concurrent reads
//! - Automatic migration execution
//!
//! Two tables matter to a run: `songs` (videos already archived, keyed by
//! video id) and `archive_queue` (watch URLs waiting for the archiver).
//!
//! # Example
//!
//! ```no_run
//! use covercrawl_core::Database;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(Path::new("archive.db")).await?;
//! if !db.is_archived("dQw4w9WgXcQ").await? {
//!     db.enqueue("https://youtube.com/watch?v=dQw4w9WgXcQ", 0).await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, instrument};

/// Default maximum number of connections in the pool.
/// Kept low for SQLite since it uses file-level locking.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in milliseconds.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Database-related errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// Failed to connect to or query the database.
    #[error("database error: {0}")]
    Connection(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Database connection wrapper with connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database at `db_path`, enables WAL
    /// and runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the connection fails,
    /// or `DbError::Migration` if migrations fail.
    #[instrument(skip(db_path), fields(path = %db_path.display()))]
    pub async fn new(db_path: &Path) -> Result<Self, DbError> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect(&db_url)
            .await?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;
        sqlx::query(&format!("PRAGMA busy_timeout={BUSY_TIMEOUT_MS}"))
            .execute(&pool)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Creates an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the connection fails,
    /// or `DbError::Migration` if migrations fail.
    #[instrument]
    pub async fn new_in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns true if `video_id` is already in `songs`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the query fails.
    #[instrument(skip(self))]
    pub async fn is_archived(&self, video_id: &str) -> Result<bool, DbError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT video_id FROM songs WHERE video_id = ?")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Returns true if `url` is already waiting in `archive_queue`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the query fails.
    #[instrument(skip(self))]
    pub async fn is_queued(&self, url: &str) -> Result<bool, DbError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM archive_queue WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Appends `url` to `archive_queue` and returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the insert fails (including a URL
    /// that is already queued).
    #[instrument(skip(self))]
    pub async fn enqueue(&self, url: &str, mode: i64) -> Result<i64, DbError> {
        let result = sqlx::query("INSERT INTO archive_queue (url, mode) VALUES (?, ?)")
            .bind(url)
            .bind(mode)
            .execute(&self.pool)
            .await?;
        let id = result.last_insert_rowid();
        debug!(id, "queued");
        Ok(id)
    }

    /// Records `video_id` as archived.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the insert fails.
    #[instrument(skip(self))]
    pub async fn mark_archived(&self, video_id: &str, title: Option<&str>) -> Result<(), DbError> {
        sqlx::query("INSERT OR IGNORE INTO songs (video_id, title) VALUES (?, ?)")
            .bind(video_id)
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Queued URLs, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the query fails.
    pub async fn queued_urls(&self) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT url FROM archive_queue ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(url,)| url).collect())
    }

    /// Gracefully closes all connections in the pool. Clones share the
    /// pool, so this closes them too.
    #[instrument(skip(self))]
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Returns true once [`Database::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
