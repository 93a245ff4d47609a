//! # kasir-core: Pure Business Logic for Kasir POS
//!
//! This crate contains the domain model and the checkout engine as pure
//! code. It never touches a database or a socket; storage is reached only
//! through the [`checkout::CheckoutStore`] trait.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │   /products  /categories  /checkout  /transactions  /report     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  engine   │  │   rules   │  │   │
//! │  │   │Transaction│  │           │  │  + trait  │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ implements CheckoutStore               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Transaction, SalesReport)
//! - [`money`] - Money type with checked integer arithmetic
//! - [`checkout`] - The checkout engine and the store trait it runs against
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::Money;
//!
//! let price = Money::from_minor(3000);
//! let subtotal = price.checked_mul_quantity(4).unwrap();
//! assert_eq!(subtotal.minor(), 12000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{run_checkout, CheckoutStore, PlannedLine};
pub use error::{CheckoutError, CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a product or category name, in characters.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum number of distinct products in one checkout.
///
/// Keeps the snapshot query well below SQLite's bound-parameter limit.
pub const MAX_CART_ITEMS: usize = 500;
