//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kasir POS                              │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ├── ValidationError ───────────────► 400 VALIDATION_ERROR      │
//! │         ├── CoreError::ProductNotFound ────► 400 PRODUCT_NOT_FOUND     │
//! │         ├── CoreError::InsufficientStock ──► 400 INSUFFICIENT_STOCK    │
//! │         ├── DbError::NotFound ─────────────► 404 NOT_FOUND             │
//! │         ├── DbError::InvalidReference ─────► 400 VALIDATION_ERROR      │
//! │         ├── DbError::ForeignKeyViolation ──► 409 CONFLICT              │
//! │         └── anything else ─────────────────► 500 (details logged only) │
//! │                                                                         │
//! │  Response body:                                                         │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for product 1: available 6, ..." }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkout's not-found is a 400, not a 404: the resource addressed by
//! `POST /checkout` exists, the cart is what's wrong.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use kasir_core::{CheckoutError, CoreError, ValidationError};
use kasir_db::DbError;

/// Handler result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from HTTP handlers.
///
/// ## Serialization
/// This is what the client receives when a request fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed body, bad path parameter or invalid field (400)
    ValidationError,

    /// Cart references a product that doesn't exist (400)
    ProductNotFound,

    /// Cart asks for more than is in stock (400)
    InsufficientStock,

    /// Addressed resource not found (404)
    NotFound,

    /// Delete blocked by a reference (409)
    Conflict,

    /// Store failure, details logged only (500)
    DatabaseError,

    /// Checkout did not finish in time (500)
    Timeout,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::ProductNotFound | ErrorCode::InsufficientStock => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
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
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// HTTP status this error is sent with.
    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Conversions
// =============================================================================

/// Storage failures. Client-caused variants keep their message; the rest
/// are logged and replaced with a generic one.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_transient() {
            tracing::error!(error = %err, "Store saturated");
            return ApiError::new(ErrorCode::DatabaseError, "Store is busy, retry shortly");
        }

        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::InvalidReference { .. } => ApiError::validation(err.to_string()),
            DbError::ForeignKeyViolation { message } => ApiError::new(ErrorCode::Conflict, message),
            DbError::Busy(_)
            | DbError::PoolExhausted
            | DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::Internal(_) => {
                tracing::error!(error = %err, "Store operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Store operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) => ApiError::new(ErrorCode::ProductNotFound, err.to_string()),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::AmountOverflow { .. } => ApiError::validation(err.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts checkout results. Store failures and timeouts are logged by
/// the checkout repository; the client only sees a generic message.
impl From<CheckoutError<DbError>> for ApiError {
    fn from(err: CheckoutError<DbError>) -> Self {
        match err {
            CheckoutError::Domain(e) => e.into(),
            CheckoutError::Store(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Checkout could not be completed")
            }
            CheckoutError::Timeout(_) => {
                ApiError::new(ErrorCode::Timeout, "Checkout timed out, no changes were made")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
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
    use std::time::Duration;

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_value(ApiError::new(ErrorCode::InsufficientStock, "x")).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert_eq!(json["message"], "x");
    }

    #[test]
    fn test_checkout_errors_map_to_400() {
        let not_found: ApiError = CheckoutError::<DbError>::Domain(CoreError::ProductNotFound(99)).into();
        assert_eq!(not_found.status(), StatusCode::BAD_REQUEST);
        assert_eq!(not_found.code, ErrorCode::ProductNotFound);
        assert!(not_found.message.contains("99"));

        let shortage: ApiError = CheckoutError::<DbError>::Domain(CoreError::InsufficientStock {
            product_id: 1,
            requested: 20,
            available: 6,
        })
        .into();
        assert_eq!(shortage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(shortage.code, ErrorCode::InsufficientStock);
        assert!(shortage.message.contains("available 6"));
        assert!(shortage.message.contains("requested 20"));
    }

    #[test]
    fn test_infrastructure_errors_are_generic() {
        let store: ApiError =
            CheckoutError::Store(DbError::QueryFailed("disk I/O error at page 7".into())).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!store.message.contains("page 7"));

        let timeout: ApiError = CheckoutError::<DbError>::Timeout(Duration::from_secs(10)).into();
        assert_eq!(timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(timeout.code, ErrorCode::Timeout);

        let query: ApiError = DbError::QueryFailed("no such column: stok".into()).into();
        assert_eq!(query.message, "Store operation failed");

        let busy: ApiError = DbError::Busy("database is locked".into()).into();
        assert_eq!(busy.code, ErrorCode::DatabaseError);
        assert_eq!(busy.message, "Store is busy, retry shortly");
    }

    #[test]
    fn test_catalog_errors() {
        let missing: ApiError = DbError::not_found("Product", 5).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "Product not found: 5");

        let bad_ref: ApiError = DbError::invalid_reference("category", 9).into();
        assert_eq!(bad_ref.status(), StatusCode::BAD_REQUEST);

        let in_use: ApiError = DbError::foreign_key("category 1 is still assigned to products").into();
        assert_eq!(in_use.status(), StatusCode::CONFLICT);
        assert_eq!(in_use.message, "category 1 is still assigned to products");
    }

    #[test]
    fn test_validation_error() {
        let err: ApiError = ValidationError::Required {
            field: "name".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "name is required");
    }
}
