//! # Validation Module
//!
//! Input validation utilities for Kasir POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Json / Path)                            │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Names non-empty, bounded                                          │
//! │  └── Quantities positive, prices and stock non-negative                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (price >= 0, stock >= 0, quantity > 0)          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("Indomie Goreng").unwrap();
//! validate_quantity(4).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CART_ITEMS, MAX_NAME_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product or category name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_name;
///
/// assert!(validate_name("Indomie Goreng").is_ok());
/// assert!(validate_name("  ").is_err());
/// assert!(validate_name(&"A".repeat(201)).is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested checkout quantity.
///
/// ## User Workflow
/// ```text
/// POST /checkout { items: [{ product_id: 1, quantity: 0 }] }
///      │
///      ▼
/// validate_quantity(0) ← THIS FUNCTION
///      │
///      ├── qty <= 0? → Error: "quantity must be positive"
///      │
///      └── OK → continue to stock resolution
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a product id supplied by a client.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates the number of distinct products in a cart.
pub fn validate_cart_size(distinct_items: usize) -> ValidationResult<()> {
    if distinct_items > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: i64::try_from(MAX_CART_ITEMS).unwrap_or(i64::MAX),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Indomie Goreng").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(200)).is_ok());
        assert!(validate_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_name_counts_characters_not_bytes() {
        // 200 two-byte characters
        assert!(validate_name(&"é".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(10_000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("product_id", 1).is_ok());
        assert_eq!(
            validate_id("product_id", 0),
            Err(ValidationError::MustBePositive {
                field: "product_id".to_string()
            })
        );
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_minor(3000)).is_ok());
        assert!(validate_price(Money::from_minor(-100)).is_err());

        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_ok());
        assert!(matches!(
            validate_cart_size(MAX_CART_ITEMS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
