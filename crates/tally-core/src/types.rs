//! # Domain Types
//!
//! Core domain records used throughout Tally POS.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Transaction   │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  barcode        │   │  receipt_number │   │  username       │       │
//! │  │  price_cents    │   │  cashier_id     │   │  role           │       │
//! │  │  stock_quantity │   │  items[]        │   │  is_active      │       │
//! │  │  min_stock_level│   │  status         │   └─────────────────┘       │
//! │  │  category_id ───┼─┐ │  total_cents    │                              │
//! │  └─────────────────┘ │ └─────────────────┘                              │
//! │                      │                                                  │
//! │  ┌─────────────────┐ │ ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄┘ │TransactionStatus│   │ PaymentMethod   │       │
//! │  │  name           │   │  Completed      │   │  Cash           │       │
//! │  │  product_count  │   │  Refunded       │   │  Card           │       │
//! │  └─────────────────┘   │  Pending        │   │  Mobile         │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for relations
//! - Business ID: (barcode, receipt_number, username) - human-facing
//!
//! All JSON is camelCase because the SPA reads these records directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::role::Role;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Barcode scanned at checkout (EAN-13, UPC-A, internal code).
    pub barcode: String,

    /// Display name shown to the cashier and on the receipt.
    pub name: String,

    pub description: Option<String>,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Unit cost in cents (for profit and stock value).
    pub cost_cents: i64,

    /// Units on hand. Never negative.
    pub stock_quantity: i64,

    /// At or below this level the product is flagged as low stock.
    pub min_stock_level: i64,

    pub category_id: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Low stock: stock quantity at or below the minimum stock level.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock_quantity <= 0
    }

    /// Checks if `quantity` units can be sold without going negative.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && self.stock_quantity >= quantity
    }

    /// Units on hand valued at cost.
    pub fn stock_value_at_cost(&self) -> Money {
        self.cost().multiply_quantity(self.stock_quantity.max(0))
    }

    /// Units on hand valued at the selling price.
    pub fn stock_value_at_retail(&self) -> Money {
        self.price().multiply_quantity(self.stock_quantity.max(0))
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Number of active products in this category (derived on read).
    pub product_count: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Transaction Status
// =============================================================================

/// The status of a sale transaction.
///
/// ```text
///   checkout ──► Completed ──refund──► Refunded
///      │             ▲
///      └─► Pending ──┘ complete
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Paid and finalized; stock has been taken.
    Completed,
    /// Money returned; stock has been put back.
    Refunded,
    /// Recorded but not yet paid; stock untouched.
    Pending,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Refunded => "refunded",
            TransactionStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(TransactionStatus::Completed),
            "refunded" => Ok(TransactionStatus::Refunded),
            "pending" => Ok(TransactionStatus::Pending),
            _ => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: "must be completed, refunded or pending".to_string(),
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash; tender and change are recorded.
    Cash,
    /// Card on an external terminal.
    Card,
    /// Mobile wallet / QR payment.
    Mobile,
}

impl PaymentMethod {
    /// Fixed ordering used by reports so columns line up across exports.
    pub const ALL: [PaymentMethod; 3] =
        [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Mobile];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mobile => "mobile",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Mobile => "Mobile",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A sale transaction.
///
/// Immutable after creation except for status transitions and delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Human-facing number printed on the receipt.
    pub receipt_number: String,
    pub cashier_id: String,
    /// Cashier's display name at read time (joined, not stored).
    pub cashier_name: Option<String>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    /// For cash: amount the customer handed over.
    pub amount_tendered_cents: Option<i64>,
    /// For cash: change returned.
    pub change_cents: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub refunded_at: Option<DateTime<Utc>>,
    /// Line items. Loaded separately from the header row.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<TransactionItem>,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Cost of goods for this sale (from frozen unit costs).
    pub fn cost(&self) -> Money {
        self.items.iter().map(|i| i.line_cost()).sum()
    }
}

// =============================================================================
// Transaction Item
// =============================================================================

/// A line item in a transaction.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    /// Barcode at time of sale (frozen).
    pub barcode_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Unit cost in cents at time of sale (frozen).
    pub unit_cost_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl TransactionItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    #[inline]
    pub fn line_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account. The password hash is kept out of this type on purpose;
/// it never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, min: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            barcode: "4006381333931".to_string(),
            name: "Ballpoint Pen".to_string(),
            description: None,
            price_cents: 150,
            cost_cents: 60,
            stock_quantity: stock,
            min_stock_level: min,
            category_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        assert!(product(5, 5).is_low_stock());
        assert!(product(4, 5).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
    }

    #[test]
    fn test_can_sell() {
        let p = product(3, 1);
        assert!(p.can_sell(3));
        assert!(!p.can_sell(4));

        let mut inactive = product(10, 1);
        inactive.is_active = false;
        assert!(!inactive.can_sell(1));
    }

    #[test]
    fn test_stock_values() {
        let p = product(10, 2);
        assert_eq!(p.stock_value_at_cost().cents(), 600);
        assert_eq!(p.stock_value_at_retail().cents(), 1500);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "Refunded".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Refunded
        );
        assert!("void".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let json = serde_json::to_value(product(1, 1)).unwrap();
        assert!(json.get("stockQuantity").is_some());
        assert!(json.get("minStockLevel").is_some());
        assert!(json.get("stock_quantity").is_none());
    }
}
