//! # Product Handlers
//!
//! Catalog CRUD over [`kasir_db::ProductRepository`].

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use super::{path_id, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use kasir_core::{NewProduct, Product};

/// `GET /products`
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let products = state.db.products().list().await?;
    Ok(Json(products))
}

/// `GET /products/{id}`, with the category embedded when set.
pub async fn get_product(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Product>> {
    let id = path_id(path)?;

    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id.to_string()))
}

/// `POST /products`
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(payload) = payload?;
    let product = state.db.products().insert(&payload.validate()?).await?;

    info!(id = product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /products/{id}`: full replace.
pub async fn update_product(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let id = path_id(path)?;
    let Json(payload) = payload?;
    let product = state.db.products().update(id, &payload.validate()?).await?;

    info!(id, "Product updated");
    Ok(Json(product))
}

/// `DELETE /products/{id}`
pub async fn delete_product(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = path_id(path)?;
    state.db.products().delete(id).await?;

    info!(id, "Product deleted");
    Ok(Json(MessageResponse::new(format!("Product {id} deleted"))))
}
