//! # Database Migrations
//!
//! SQL files in `migrations/sqlite/` are embedded at compile time and
//! applied in filename order on startup.
//!
//! ## Adding New Migrations
//!
//! 1. Create `migrations/sqlite/NNN_description.sql` with the next number
//! 2. **NEVER** modify an applied migration, always add a new one

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Embedded vs. applied migration counts, reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Counts successfully applied migrations.
///
/// Fails if the bookkeeping table is missing (migrations never ran).
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: usize::try_from(applied).unwrap_or(0),
    })
}
