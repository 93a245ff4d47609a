//! # Checkout Handler
//!
//! ```text
//! POST /checkout {"items":[{"product_id":1,"quantity":4}]}
//!        │
//!        ▼
//! CheckoutRepository::checkout ── BEGIN IMMEDIATE ── run_checkout ── COMMIT
//!        │
//!        ├── Ok(Transaction)            → 200
//!        ├── ProductNotFound / Stock    → 400
//!        └── Store / Timeout            → 500 (rolled back)
//! ```
//!
//! Not idempotent: every accepted request records a new sale.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::error::ApiResult;
use crate::AppState;
use kasir_core::{CheckoutRequest, Transaction};

/// `POST /checkout`
pub async fn checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<Json<Transaction>> {
    let Json(request) = payload?;
    let transaction = state.db.checkout().checkout(&request.items).await?;
    Ok(Json(transaction))
}
