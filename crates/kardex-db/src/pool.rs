//! # Database Handle
//!
//! Opens the SQLite pool the engine writes through and hands out the
//! invoice and payment services.
//!
//! ## Writers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       One Writer At A Time                              │
//! │                                                                         │
//! │  request A ─► BEGIN ─► first statement is a write ─► ... ─► COMMIT      │
//! │                              │ takes the database write lock            │
//! │                              ▼                                          │
//! │  request B ─► BEGIN ─► first write waits up to busy_timeout             │
//! │                              │                                          │
//! │                              ├── lock released  ─► proceeds, reads      │
//! │                              │                     A's committed rows   │
//! │                              └── timeout ───────► DbError::Conflict     │
//! │                                                   (service retries)     │
//! │                                                                         │
//! │  Readers never wait: WAL serves them the last committed snapshot.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::service::invoice::InvoiceService;
use crate::service::payment::PaymentService;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Pool settings.
///
/// ```rust,ignore
/// let config = DbConfig::new("./data/kardex.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created when missing. `:memory:` for a private in-memory database.
    pub database_path: PathBuf,

    /// Pool size. Default: 5
    pub max_connections: u32,

    /// How long a request waits for a free pooled connection. Default: 30s
    pub acquire_timeout: Duration,

    /// How long a writer waits for the database lock before the attempt
    /// surfaces as a conflict. Default: 5s
    pub busy_timeout: Duration,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Private in-memory database for tests.
    ///
    /// Every connection to `:memory:` opens its own empty database, so the
    /// pool is pinned to one connection.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(IN_MEMORY)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the engine's storage. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Opening database"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!("Pool connected");

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// Raw pool, for seeding and diagnostics. Engine writes go through
    /// [`invoices`](Self::invoices) and [`payments`](Self::payments).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Invoice lifecycle operations.
    pub fn invoices(&self) -> InvoiceService {
        InvoiceService::new(self.pool.clone())
    }

    /// Payment recording and reconciliation.
    pub fn payments(&self) -> PaymentService {
        PaymentService::new(self.pool.clone())
    }

    /// True when a connection can be acquired and the schema is current.
    pub async fn health_check(&self) -> bool {
        match migrations::migration_status(&self.pool).await {
            Ok(status) => status.is_current(),
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[tokio::test]
    async fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("kardex.db")).max_connections(2))
            .await
            .unwrap();

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await;
    }

    #[test]
    fn test_in_memory_config_pins_one_connection() {
        let config = DbConfig::in_memory().busy_timeout(Duration::from_millis(250));

        assert!(config.is_in_memory());
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!DbConfig::new("/tmp/kardex.db").is_in_memory());
    }
}
