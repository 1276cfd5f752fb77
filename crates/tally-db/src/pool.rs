//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Server startup                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path).max_connections(n)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ── pool + migrations                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │  (max_connections)        │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │                           │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  axum handlers: db.products(), db.transactions(), ...                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL mode is enabled so report queries do not block checkouts.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::category::CategoryRepository;
use crate::repository::product::ProductRepository;
use crate::repository::transaction::TransactionRepository;
use crate::repository::user::UserRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./data/tally.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Default: 5
    pub max_connections: u32,

    /// Default: 1
    pub min_connections: u32,

    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Default: 10 minutes. Ignored for in-memory databases.
    pub idle_timeout: Duration,

    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for a file database, created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for tests).
    ///
    /// The pool is pinned to a single connection that is never recycled;
    /// the database lives exactly as long as that connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone; clones share the pool. The server keeps one in its
/// `AppState` and handlers ask it for the repository they need:
///
/// ```rust,ignore
/// async fn get_product(State(state): State<AppState>, Path(id): Path<String>)
///     -> Result<Json<Product>, ApiError>
/// {
///     let product = state.db.products().get_by_id(&id).await?;
///     Ok(Json(product))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates the pool and, unless disabled, runs migrations.
    ///
    /// SQLite settings:
    /// - WAL journal
    /// - NORMAL synchronous
    /// - foreign keys ON (off by default in SQLite)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let base_options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        let connect_options = base_options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout);

        pool_options = if config.is_in_memory() {
            pool_options.idle_timeout(None).max_lifetime(None)
        } else {
            pool_options.idle_timeout(Some(config.idle_timeout))
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// For queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Returns true if the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn migration_status(&self) -> DbResult<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let status = db.migration_status().await.unwrap();
        assert!(status.embedded > 0);
        assert_eq!(status.applied, status.embedded);
        assert!(status.is_current());
    }

    #[tokio::test]
    async fn test_migration_status_fails_without_migrations() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        assert!(db.health_check().await);
        assert!(db.migration_status().await.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
