//! # Domain Types
//!
//! Core domain types used throughout Kasir POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                              Ledger                            │
//! │  ┌─────────────────┐                  ┌─────────────────────┐          │
//! │  │    Category     │                  │    Transaction      │          │
//! │  │  ─────────────  │                  │  ─────────────────  │          │
//! │  │  id (i64)       │                  │  id (i64)           │          │
//! │  │  name           │                  │  total_amount       │          │
//! │  │  description    │                  │  created_at         │          │
//! │  └────────▲────────┘                  │  items ─────────┐   │          │
//! │           │ category_id               └─────────────────┼───┘          │
//! │  ┌────────┴────────┐                  ┌─────────────────▼───┐          │
//! │  │    Product      │◄── product_id ───│ TransactionLineItem │          │
//! │  │  ─────────────  │                  │  ─────────────────  │          │
//! │  │  id (i64)       │                  │  product_name (snap)│          │
//! │  │  name           │                  │  unit_price (snap)  │          │
//! │  │  price (Money)  │                  │  quantity           │          │
//! │  │  stock          │                  │  subtotal           │          │
//! │  └─────────────────┘                  └─────────────────────┘          │
//! │                                                                         │
//! │  Requests: NewProduct, NewCategory, CheckoutRequest(CheckoutItem)      │
//! │  Reports:  SalesReport, BestSeller                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every stored entity has an `i64` id assigned by the database at insert
//! time. Ids are monotonic and never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::validation::{validate_name, validate_price, validate_stock, ValidationResult};

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewCategory {
    /// Validates the payload and returns it with the name trimmed.
    pub fn validate(self) -> ValidationResult<Self> {
        validate_name(&self.name)?;
        Ok(NewCategory {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Store-assigned identifier.
    pub id: i64,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit price in the smallest currency unit.
    pub price: Money,

    /// Units currently on hand. Never negative.
    #[serde(alias = "stok")]
    pub stock: i64,

    /// Optional category reference.
    pub category_id: Option<i64>,

    /// Embedded category, populated only on single-product reads.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if the requested quantity can be taken from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }
}

/// Create/update payload for a product.
///
/// Updates are full replacements, so the same shape serves both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    #[serde(alias = "stok")]
    pub stock: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
}

impl NewProduct {
    /// Validates the payload and returns it with the name trimmed.
    ///
    /// Whether `category_id` resolves is a storage question and is checked
    /// by the repository.
    pub fn validate(self) -> ValidationResult<Self> {
        validate_name(&self.name)?;
        validate_price(self.price)?;
        validate_stock(self.stock)?;
        Ok(NewProduct {
            name: self.name.trim().to_string(),
            ..self
        })
    }
}

// =============================================================================
// Checkout Request
// =============================================================================

/// One requested line of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: i64,
    pub quantity: i64,
}

/// Body of `POST /checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
}

// =============================================================================
// Transaction
// =============================================================================

/// A completed sale. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: i64,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<TransactionLineItem>,
}

impl Transaction {
    /// True when the total equals the sum of line subtotals and every
    /// subtotal equals quantity × unit price.
    pub fn totals_are_consistent(&self) -> bool {
        let lines_ok = self.items.iter().all(|item| {
            item.unit_price.checked_mul_quantity(item.quantity) == Some(item.subtotal)
        });
        let sum: Money = self.items.iter().map(|item| item.subtotal).sum();
        lines_ok && sum == self.total_amount
    }
}

/// A line of a transaction.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionLineItem {
    pub id: i64,
    pub transaction_id: i64,
    pub product_id: i64,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    /// unit_price × quantity.
    pub subtotal: Money,
}

// =============================================================================
// Reports
// =============================================================================

/// The product with the most units sold in a reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BestSeller {
    pub name: String,
    pub quantity_sold: i64,
}

/// Daily rollup over the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub total_revenue: Money,
    pub total_transactions: i64,
    pub best_seller: Option<BestSeller>,
}

impl SalesReport {
    /// Report for a day with no sales.
    pub fn empty() -> Self {
        SalesReport {
            total_revenue: Money::zero(),
            total_transactions: 0,
            best_seller: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
