//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate holds the business rules of the point-of-sale backend as pure
//! functions and plain data. Nothing in here touches the database, the
//! network or the clock; callers pass `now` in when time matters.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              SPA (admin / manager / cashier dashboards)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over /api/*                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-server (axum)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │  role   │ │ report  │  │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │  Role   │ │ Sales   │  │   │
//! │  │   │ Txn     │ │         │ │ Tender  │ │ Perm.   │ │ Stock   │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                  ┌────────────┐  ┌─────────┐                    │   │
//! │  │                  │ validation │  │  scan   │                    │   │
//! │  │                  └────────────┘  └─────────┘                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Category, Transaction, User)
//! - [`money`] - Integer money in cents
//! - [`cart`] - Checkout pricing and cash tender
//! - [`role`] - Role tiers and the permission matrix
//! - [`report`] - Sales and inventory aggregation
//! - [`scan`] - Barcode scan de-duplication
//! - [`validation`] - Input validation rules
//! - [`input`] - Create/update payloads sent by the SPA
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::role::{Permission, Role};
//!
//! let price = Money::from_cents(1099);
//! assert_eq!(price.multiply_quantity(3).cents(), 3297);
//!
//! assert!(Role::Manager.can(Permission::Restock));
//! assert!(!Role::Cashier.can(Permission::ManageUsers));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod input;
pub mod money;
pub mod report;
pub mod role;
pub mod scan;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use role::{Permission, Role};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single checkout.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against typing 1000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest price or unit cost accepted, in cents ($1 000 000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Most units a product may hold in stock.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

/// Largest single restock accepted.
pub const MAX_RESTOCK_QUANTITY: i64 = 100_000;

/// Longest range a report may cover, in days.
pub const MAX_REPORT_RANGE_DAYS: i64 = 366;
