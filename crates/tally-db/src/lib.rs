//! # tally-db: Database Layer for Tally POS
//!
//! SQLite storage for the catalogue, sales and staff accounts, using sqlx
//! with runtime-bound queries.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/transactions)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ Product       │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ Category      │    │ 001_init.sql │  │   │
//! │  │   │               │    │ Transaction   │    │              │  │   │
//! │  │   │               │    │ User          │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (database.path in tally.toml)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`password`] - Argon2 hashing for stored accounts
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//! let low = db.products().low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::product::{ProductFilter, ProductRepository};
pub use repository::transaction::{NewTransaction, TransactionFilter, TransactionRepository};
pub use repository::user::{UserRecord, UserRepository};
