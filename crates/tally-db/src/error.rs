//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error ──────────────┐                                           │
//! │                            ▼                                            │
//! │  CoreError (stock, status) ──► DbError (this module)                   │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │                              ApiError (tally-server) ──► HTTP status   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rule violations detected inside a SQL transaction (stock ran out
//! between pricing and commit, a refund of a pending sale) are carried as
//! [`DbError::Domain`] so the server maps them exactly like the checks done
//! in `tally-core`.

use tally_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (barcode, username, category name).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Product references a category id that does not exist
    /// - Deleting a user who still owns transactions
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The row exists but the operation is not allowed in its current state.
    ///
    /// ## When This Occurs
    /// - Deleting a category that still has active products
    /// - Demoting, deactivating or deleting the last active admin
    #[error("{0}")]
    Conflict(String),

    /// Business rule violated inside a SQL transaction.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DbError::Conflict(message.into())
    }

    /// Replaces the placeholder value of a UniqueViolation with the real one.
    ///
    /// SQLite only reports `table.column`, so repositories call this with the
    /// value they tried to write.
    pub fn with_duplicate_value(self, value: &str) -> Self {
        match self {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: value.to_string(),
            },
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: products.barcode"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .and_then(|column| column.split('.').nth(1))
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_duplicate_value_only_touches_unique() {
        let err = DbError::duplicate("barcode", "unknown").with_duplicate_value("123");
        assert_eq!(err.to_string(), "Duplicate barcode: '123' already exists");

        let err = DbError::not_found("Product", "p-1").with_duplicate_value("123");
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
