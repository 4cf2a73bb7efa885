// crates/db/src/lib.rs
//! SQLite-backed aggregation queries for the model monitor.
//!
//! The fact tables are materialized by an external pipeline; everything in
//! this crate is read-only per request — open a pool, run parameterized
//! aggregations, shape rows into the dashboard's response contracts.

pub mod grouped;
mod migrations;
pub mod months;

pub use grouped::{
    GroupTrendPoint, GroupTrendSeries, GroupedMetricRow, GroupedMetricsSnapshot, GroupedQuery,
    GroupedTrends, DEFAULT_TREND_GROUPS, SNAPSHOT_GROUP_LIMIT,
};
pub use months::{
    MetricCards, MetricTrendCards, MonthOption, MonthlyTrendPoint, SparkCountCard, SparkMeanCard,
};

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{ConnectOptions, SqlitePool};
use thiserror::Error;
use tracing::info;

use model_monitor_core::MonthKeyError;

/// Store-level failures. Every variant surfaces to the caller as a generic
/// "data unavailable" response; nothing in this crate retries.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("stored month bucket could not be parsed: {0}")]
    MonthKey(#[from] MonthKeyError),

    #[error("failed to determine data directory")]
    NoDataDir,

    #[error("failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Main database handle wrapping a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at the given path and run migrations.
    pub async fn new(path: &Path) -> DbResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30))
            .log_slow_statements(
                tracing::log::LevelFilter::Warn,
                std::time::Duration::from_secs(5),
            );

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    ///
    /// Uses a uniquely-named shared-cache memory database so all pool
    /// connections see the same data. A plain `:memory:` gives every
    /// connection its own database; an unnamed shared-cache one is shared
    /// by every pool in the process, which breaks test isolation.
    pub async fn new_in_memory() -> DbResult<Self> {
        static MEMORY_DB_SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);

        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite:monitor-mem-{seq}?mode=memory&cache=shared"
        ))?
        .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Open the database at the platform default location
    /// (`<data dir>/model-monitor/monitor.db`).
    pub async fn open_default() -> DbResult<Self> {
        Self::new(&Self::default_path()?).await
    }

    /// Platform default database path.
    pub fn default_path() -> DbResult<PathBuf> {
        let dir = dirs::data_local_dir().ok_or(DbError::NoDataDir)?;
        Ok(dir.join("model-monitor").join("monitor.db"))
    }

    async fn run_migrations(&self) -> DbResult<()> {
        for statement in migrations::MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// The underlying connection pool. Exposed for test fixtures and the
    /// occasional ad-hoc query; request handling goes through the typed
    /// methods on [`Database`].
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for in-flight connections to drain.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
