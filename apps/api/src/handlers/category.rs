//! Category CRUD over [`kasir_db::CategoryRepository`].

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use super::{path_id, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use kasir_core::{Category, NewCategory};

/// `GET /categories`
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

/// `GET /categories/{id}`
pub async fn get_category(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Category>> {
    let id = path_id(path)?;

    state
        .db
        .categories()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category", &id.to_string()))
}

/// `POST /categories`
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let Json(payload) = payload?;
    let category = state.db.categories().insert(&payload.validate()?).await?;

    info!(id = category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /categories/{id}`
pub async fn update_category(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResult<Json<Category>> {
    let id = path_id(path)?;
    let Json(payload) = payload?;
    let category = state.db.categories().update(id, &payload.validate()?).await?;

    info!(id, "Category updated");
    Ok(Json(category))
}

/// `DELETE /categories/{id}`: refused while products still use it.
pub async fn delete_category(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = path_id(path)?;
    state.db.categories().delete(id).await?;

    info!(id, "Category deleted");
    Ok(Json(MessageResponse::new(format!("Category {id} deleted"))))
}
