//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally Server                           │
//! │                                                                         │
//! │  SPA                         Rust Backend                               │
//! │  ───                         ────────────                               │
//! │                                                                         │
//! │  fetch('/api/transactions', { method: 'POST' })                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::UniqueViolation ─────┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Business Error? ─── CoreError::InsufficientStock ── ApiError ──►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄──── 422 { "code": "INSUFFICIENT_STOCK", "message": "Only 3 ..." }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged with their details and reach the client as
//! a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_db::DbError;

/// Error body returned by every failing endpoint.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 5449000000996"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
///
/// ## Usage in the SPA
/// ```typescript
/// const res = await fetch(`/api/products/${id}`);
/// if (!res.ok) {
///   const e = await res.json();
///   switch (e.code) {
///     case 'NOT_FOUND':
///       toast('Product not found');
///       break;
///     case 'UNAUTHORIZED':
///       logout();
///       break;
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Missing, invalid, expired or revoked token, or bad credentials (401)
    Unauthorized,

    /// Role does not allow the action (403)
    Forbidden,

    /// Duplicate value or record in use (409)
    Conflict,

    /// Business rule rejected the request (422)
    BusinessLogic,

    /// Insufficient stock (422)
    InsufficientStock,

    /// Cash tendered does not cover the total (422)
    PaymentError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::BusinessLogic | ErrorCode::InsufficientStock | ErrorCode::PaymentError => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::Conflict(message) => ApiError::conflict(message),
            DbError::Domain(core) => ApiError::from(core),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::TransactionNotFound(id) => ApiError::not_found("Transaction", &id),
            CoreError::ProductInactive { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::InvalidTransactionStatus { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::EmptyCart | CoreError::CartTooLarge { .. } | CoreError::AmountOverflow => {
                ApiError::validation(err.to_string())
            }
            CoreError::InsufficientTender { .. } => {
                ApiError::new(ErrorCode::PaymentError, err.to_string())
            }
            CoreError::PermissionDenied { .. } => ApiError::forbidden(err.to_string()),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Duplicate { .. } => ApiError::conflict(err.to_string()),
            _ => ApiError::validation(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{Permission, Role, TransactionStatus};

    #[test]
    fn test_error_code_serializes_screaming_snake_case() {
        let err = ApiError::new(ErrorCode::InsufficientStock, "x");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert_eq!(json["message"], "x");
    }

    #[test]
    fn test_db_errors_map_to_statuses() {
        let err: ApiError = DbError::not_found("Product", "p-1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Product not found: p-1");

        let err: ApiError = DbError::duplicate("barcode", "123").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::conflict("Category is in use").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: ApiError = DbError::QueryFailed("near \"SELEC\": syntax error".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_domain_errors_pass_through_db_layer() {
        let err: ApiError = DbError::Domain(CoreError::InsufficientStock {
            barcode: "A1".into(),
            available: 1,
            requested: 2,
        })
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = DbError::Domain(CoreError::InvalidTransactionStatus {
            id: "t-1".into(),
            current: TransactionStatus::Pending,
            action: "refund".into(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[test]
    fn test_permission_denied_is_forbidden() {
        let err: ApiError = Role::Cashier.require(Permission::Refund).unwrap_err().into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_amount_overflow_is_bad_request() {
        let err: ApiError = CoreError::AmountOverflow.into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err: ApiError = ValidationError::Required {
            field: "name".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "name is required");
    }
}
