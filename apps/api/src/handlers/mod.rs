//! # HTTP Handlers
//!
//! One module per resource. Handlers stay thin: parse, validate, call a
//! repository, translate the result.
//!
//! ```text
//! handlers/
//! ├── health.rs       GET  /health
//! ├── product.rs      /products, /products/{id}
//! ├── category.rs     /categories, /categories/{id}
//! ├── checkout.rs     POST /checkout
//! ├── transaction.rs  GET  /transactions/{id}
//! └── report.rs       GET  /report/today
//! ```
//!
//! Extractors are taken as `Result<_, Rejection>` so malformed bodies and
//! path parameters come back in the same `{code, message}` shape as every
//! other error.

pub mod category;
pub mod checkout;
pub mod health;
pub mod product;
pub mod report;
pub mod transaction;

use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use kasir_core::validation::validate_id;

/// Body returned by DELETE endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

/// Unwraps an `{id}` path segment and rejects non-positive ids.
pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    let Path(id) = path?;
    validate_id("id", id)?;
    Ok(id)
}
