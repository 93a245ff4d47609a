//! # Request Tracing Middleware
//!
//! Tags every request with an id and runs the handler inside an
//! `http.request` span, so repository and checkout logs carry it.
//!
//! ```text
//! client ── x-request-id: abc ──► span{request_id=abc} ──► handler
//!        ◄── x-request-id: abc ──                      ◄──
//! ```
//!
//! A missing or non-ASCII header gets a fresh UUID v4.

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied id that is echoed back.
const MAX_REQUEST_ID_LEN: usize = 128;

pub async fn request_tracing(request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %request.method(),
        route = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::debug!(status = response.status().as_u16(), "Request completed");
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
