//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors                                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tally-server errors                                                   │
//! │  └── ApiError         - What the SPA sees ({code, message} + status)   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP response          │
//! │        DbError ─────────────────────► ApiError                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::role::{Permission, Role};
use crate::types::TransactionStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found by id or barcode.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but has been deactivated.
    #[error("Product {barcode} is not active")]
    ProductInactive { barcode: String },

    /// Insufficient stock to complete a sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { barcode: "5449000000996", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// SPA toast: "Only 3 in stock"
    /// ```
    #[error("Insufficient stock for {barcode}: available {available}, requested {requested}")]
    InsufficientStock {
        barcode: String,
        available: i64,
        requested: i64,
    },

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Transaction is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Refunding a pending or already refunded transaction
    /// - Completing a transaction that is not pending
    #[error("Transaction {id} is {current}, cannot {action}")]
    InvalidTransactionStatus {
        id: String,
        current: TransactionStatus,
        action: String,
    },

    /// Checkout submitted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A money total does not fit in i64 cents.
    #[error("Amount is too large")]
    AmountOverflow,

    /// Cash handed over does not cover the total.
    #[error("Amount tendered {tendered} is less than total {total}")]
    InsufficientTender { total: i64, tendered: i64 },

    /// The caller's role does not grant the permission.
    #[error("Role {role} is not allowed to {permission}")]
    PermissionDenied { role: Role, permission: Permission },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic or database work runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            barcode: "5449000000996".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 5449000000996: available 3, requested 5"
        );

        let err = CoreError::InvalidTransactionStatus {
            id: "t-1".to_string(),
            current: TransactionStatus::Refunded,
            action: "refund".to_string(),
        };
        assert_eq!(err.to_string(), "Transaction t-1 is refunded, cannot refund");
    }

    #[test]
    fn test_permission_denied_message() {
        let err = CoreError::PermissionDenied {
            role: Role::Cashier,
            permission: Permission::ManageUsers,
        };
        assert_eq!(err.to_string(), "Role cashier is not allowed to manage users");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
