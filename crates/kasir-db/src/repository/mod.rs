//! # Repository Module
//!
//! Database repository implementations for Kasir POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP Handler                                                           │
//! │       │                                                                 │
//! │       │  state.db.products().get_by_id(1)                              │
//! │       ▼                                                                 │
//! │  ProductRepository / CategoryRepository   catalog CRUD                 │
//! │  CheckoutRepository                       the only ledger writer       │
//! │  TransactionRepository                    ledger reads                 │
//! │  ReportRepository                         daily rollup                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository holds a clone of the pool and is created per use via
//! the accessors on [`crate::Database`].

pub mod category;
pub mod checkout;
pub mod product;
pub mod report;
pub mod transaction;
