//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── ValidationError   - Malformed input, rejected before the store    │
//! │  ├── CoreError         - Domain rule violations (not found, stock)     │
//! │  └── CheckoutError<E>  - Checkout outcome: domain | store | timeout    │
//! │                                                                         │
//! │  kasir-db errors (separate crate)                                      │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError          - What HTTP clients see (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → ApiError          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages carry the ids and quantities involved. Whether an error is the
//! client's fault is decided by its type, never by parsing the message.

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is a client-side problem: the request referenced something
/// that does not exist or asked for more than the catalog can give.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Checkout references a product id with no catalog row
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Insufficient stock to complete the checkout.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (product 1, qty: 20)
    ///      │
    ///      ▼
    /// Check stock: available=6
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 1, requested: 20, available: 6 }
    ///      │
    ///      ▼
    /// Client shows: "Only 6 left"
    /// ```
    #[error(
        "Insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: i64,
        requested: i64,
        available: i64,
    },

    /// A monetary amount does not fit in the integer money type.
    #[error("Amount overflow while pricing product {product_id}")]
    AmountOverflow { product_id: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A collection field has no entries.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Outcome of a failed checkout.
///
/// Generic over the store's error type so the engine never has to know
/// which database sits underneath.
///
/// ```text
/// Domain(..)   → client error (400), nothing was written
/// Store(..)    → infrastructure error (500), scope rolled back
/// Timeout(..)  → infrastructure error (500), scope rolled back
/// ```
#[derive(Debug, Error)]
pub enum CheckoutError<E: std::error::Error + 'static> {
    /// The request violated a domain rule.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The store failed while reading or committing.
    #[error("Storage failure during checkout: {0}")]
    Store(#[source] E),

    /// The checkout did not finish within the configured bound.
    #[error("Checkout timed out after {0:?}")]
    Timeout(Duration),
}

impl<E: std::error::Error + 'static> CheckoutError<E> {
    /// Returns true if the caller sent a bad request (not retryable).
    pub fn is_client_error(&self) -> bool {
        matches!(self, CheckoutError::Domain(_))
    }

    /// Returns the domain error, if this is one.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            CheckoutError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

impl<E: std::error::Error + 'static> From<ValidationError> for CheckoutError<E> {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Domain(CoreError::Validation(err))
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
