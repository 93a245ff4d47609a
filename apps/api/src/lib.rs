//! # Kasir POS API
//!
//! axum HTTP server over the Kasir POS catalog, checkout engine and
//! sales ledger.
//!
//! ## Module Organization
//! ```text
//! kasir_api/
//! ├── lib.rs          ◄─── You are here (state, router, tracing setup)
//! ├── main.rs         ◄─── Binary: config, bind, serve, shutdown
//! ├── config.rs       ◄─── TOML + environment configuration
//! ├── error.rs        ◄─── ApiError and status mapping
//! ├── middleware.rs   ◄─── x-request-id and the http.request span
//! └── handlers/       ◄─── One module per resource
//! ```
//!
//! ## Route Table
//! ```text
//! ┌────────┬──────────────────────┬──────────────────────────────────────┐
//! │ GET    │ /health              │ 200, or 503 when the DB is down      │
//! │ GET    │ /products            │ list                                 │
//! │ POST   │ /products            │ 201                                  │
//! │ GET    │ /products/{id}       │ product + embedded category          │
//! │ PUT    │ /products/{id}       │ full replace                         │
//! │ DELETE │ /products/{id}       │ 409 once sold                        │
//! │ GET    │ /categories          │ list                                 │
//! │ POST   │ /categories          │ 201                                  │
//! │ GET    │ /categories/{id}     │                                      │
//! │ PUT    │ /categories/{id}     │                                      │
//! │ DELETE │ /categories/{id}     │ 409 while products use it            │
//! │ POST   │ /checkout            │ 200 transaction, 400 cart errors     │
//! │ GET    │ /transactions/{id}   │ transaction + line items             │
//! │ GET    │ /report/today        │ daily rollup                         │
//! └────────┴──────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! The same table is mounted under `/api/v1`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use handlers::{category, checkout, health, product, report, transaction};
use kasir_db::Database;

pub use config::{AppConfig, ConfigError, LoadReport};
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared router state. Cloned per request; the pool inside is shared.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}

/// Builds the full router with request tracing applied.
///
/// Every route is served at the root and again under `/api/v1`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .nest("/api/v1", routes())
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/products",
            get(product::list_products).post(product::create_product),
        )
        .route(
            "/products/{id}",
            get(product::get_product)
                .put(product::update_product)
                .delete(product::delete_product),
        )
        .route(
            "/categories",
            get(category::list_categories).post(category::create_category),
        )
        .route(
            "/categories/{id}",
            get(category::get_category)
                .put(category::update_category)
                .delete(category::delete_category),
        )
        .route("/checkout", post(checkout::checkout))
        .route("/transactions/{id}", get(transaction::get_transaction))
        .route("/report/today", get(report::today))
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kasir=trace` - Show trace for kasir crates only
/// - Default: `log.filter` from config
pub fn init_tracing(log: &config::LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
