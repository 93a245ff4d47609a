//! Read-only view of the ledger.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::path_id;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use kasir_core::Transaction;

/// `GET /transactions/{id}`, line items included.
pub async fn get_transaction(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Transaction>> {
    let id = path_id(path)?;

    state
        .db
        .transactions()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Transaction", &id.to_string()))
}
