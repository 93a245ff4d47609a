//! # kasir-db: Database Layer for Kasir POS
//!
//! This crate provides database access for the Kasir POS system.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /checkout)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasir-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │ 001_initial_ │  │   │
//! │  │   │ SqlitePool    │◄───│ CategoryRepo  │    │   schema.sql │  │   │
//! │  │   │               │    │ CheckoutRepo  │    │              │  │   │
//! │  │   │               │    │ Transaction/  │    │              │  │   │
//! │  │   │               │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./kasir.db")).await?;
//!
//! let products = db.products().list().await?;
//! let tx = db.checkout().checkout(&items).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::checkout::{CheckoutRepository, CheckoutResult, SqliteCheckoutStore};
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::transaction::TransactionRepository;
