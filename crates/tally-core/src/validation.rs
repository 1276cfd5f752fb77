//! # Validation Module
//!
//! Input validation for Tally POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: SPA forms                                                    │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (barcode, username, category name)             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_barcode, validate_quantity};
//!
//! assert!(validate_barcode("5449000000996").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{
    MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_REPORT_RANGE_DAYS,
    MAX_RESTOCK_QUANTITY, MAX_STOCK_QUANTITY,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product barcode.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Only letters, digits, hyphens and underscores
///
/// ```rust
/// use tally_core::validation::validate_barcode;
///
/// assert!(validate_barcode("PEN-BLUE_01").is_ok());
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("has space").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 64,
        });
    }

    if !barcode
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 200)
}

/// Validates a category name (1-100 characters after trimming).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 100)
}

/// Validates a person's display name (1-100 characters after trimming).
pub fn validate_full_name(name: &str) -> ValidationResult<()> {
    validate_name("fullName", name, 100)
}

fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional free-text description (at most 1000 characters).
pub fn validate_description(description: Option<&str>) -> ValidationResult<()> {
    match description {
        Some(d) if d.chars().count() > 1000 => Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 1000,
        }),
        _ => Ok(()),
    }
}

/// Validates a search query. Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a login name.
///
/// ## Rules
/// - 3 to 32 characters
/// - Letters, digits, `.`, `_`, `-`
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if username.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 32,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, '.', '_' and '-'".to_string(),
        });
    }

    Ok(())
}

/// Validates a new password (8-128 characters).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }

    if password.chars().count() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates an optional email address.
///
/// Only the shape is checked: one `@`, a non-empty local part and a
/// domain containing a dot.
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity (1 to MAX_ITEM_QUANTITY).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents (0 to MAX_PRICE_CENTS). Zero is allowed
/// (free items).
///
/// ```rust
/// use tally_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    bounded("price", cents, MAX_PRICE_CENTS)
}

/// Validates a unit cost in cents (0 to MAX_PRICE_CENTS).
pub fn validate_cost_cents(cents: i64) -> ValidationResult<()> {
    bounded("cost", cents, MAX_PRICE_CENTS)
}

/// Validates a stock quantity set directly on the product form.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    bounded("stockQuantity", qty, MAX_STOCK_QUANTITY)
}

/// Validates the low-stock threshold.
pub fn validate_min_stock_level(level: i64) -> ValidationResult<()> {
    bounded("minStockLevel", level, MAX_STOCK_QUANTITY)
}

/// Validates a manual restock amount (1 to MAX_RESTOCK_QUANTITY).
pub fn validate_restock_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_RESTOCK_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_RESTOCK_QUANTITY,
        });
    }

    Ok(())
}

fn bounded(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of distinct lines in a checkout.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Identifier & Date Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use tally_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates a report date range: `from <= to` and at most
/// MAX_REPORT_RANGE_DAYS days long (inclusive).
pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> ValidationResult<()> {
    if from > to {
        return Err(ValidationError::InvalidFormat {
            field: "from".to_string(),
            reason: "must not be after 'to'".to_string(),
        });
    }

    let days = (to - from).num_days() + 1;
    if days > MAX_REPORT_RANGE_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "date range (days)".to_string(),
            min: 1,
            max: MAX_REPORT_RANGE_DAYS,
        });
    }

    Ok(())
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("5449000000996").is_ok());
        assert!(validate_barcode("PEN-01").is_ok());

        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("   ").is_err());
        assert!(validate_barcode("has space").is_err());
        assert!(validate_barcode(&"1".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_product_name("Sparkling Water 500ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
        assert!(validate_category_name(&"A".repeat(101)).is_err());
        assert!(validate_full_name("Ada Lovelace").is_ok());
    }

    #[test]
    fn test_form_rejects_invalid_price_and_stock() {
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_cost_cents(-1).is_err());
        assert!(validate_stock_quantity(-3).is_err());
        assert!(validate_min_stock_level(-1).is_err());

        assert!(validate_price_cents(0).is_ok());
        assert!(validate_stock_quantity(0).is_ok());
    }

    #[test]
    fn test_form_caps_price_and_stock() {
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_cost_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_stock_quantity(MAX_STOCK_QUANTITY).is_ok());

        assert!(matches!(
            validate_price_cents(MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { max: MAX_PRICE_CENTS, .. })
        ));
        assert!(validate_cost_cents(i64::MAX).is_err());
        assert!(validate_stock_quantity(MAX_STOCK_QUANTITY + 1).is_err());
        assert!(validate_min_stock_level(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_restock_quantity() {
        assert!(validate_restock_quantity(24).is_ok());
        assert!(validate_restock_quantity(0).is_err());
        assert!(validate_restock_quantity(MAX_RESTOCK_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_username_and_password() {
        assert!(validate_username("jane.doe").is_ok());
        assert!(validate_username("jd").is_err());
        assert!(validate_username("jane doe").is_err());
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email(None).is_ok());
        assert!(validate_email(Some("")).is_ok());
        assert!(validate_email(Some("owner@shop.example")).is_ok());
        assert!(validate_email(Some("owner.shop.example")).is_err());
        assert!(validate_email(Some("@shop.example")).is_err());
        assert!(validate_email(Some("owner@shop")).is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let d = |s| parse_date("from", s).unwrap();
        assert!(validate_date_range(d("2026-01-01"), d("2026-01-31")).is_ok());
        assert!(validate_date_range(d("2026-01-31"), d("2026-01-01")).is_err());
        assert!(validate_date_range(d("2025-01-01"), d("2026-01-02")).is_err());
        assert!(parse_date("from", "01/02/2026").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
