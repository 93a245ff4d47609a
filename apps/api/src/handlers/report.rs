//! Daily sales report.

use axum::extract::State;
use axum::Json;

use crate::error::ApiResult;
use crate::AppState;
use kasir_core::SalesReport;

/// `GET /report/today`: revenue, count and best seller for the current UTC day.
pub async fn today(State(state): State<AppState>) -> ApiResult<Json<SalesReport>> {
    Ok(Json(state.db.reports().today().await?))
}
