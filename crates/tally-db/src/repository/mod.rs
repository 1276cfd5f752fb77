//! # Repository Module
//!
//! One repository per aggregate, each a thin handle over the shared pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                           │
//! │       │  state.db.transactions().refund(&id)                            │
//! │       ▼                                                                 │
//! │  TransactionRepository ──► SQL (one transaction per operation)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`ProductRepository`](product::ProductRepository) - catalogue, restock
//! - [`CategoryRepository`](category::CategoryRepository) - categories
//! - [`TransactionRepository`](transaction::TransactionRepository) - sales and stock movement
//! - [`UserRepository`](user::UserRepository) - staff accounts

pub mod category;
pub mod product;
pub mod transaction;
pub mod user;
