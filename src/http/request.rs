//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Echo the request ID on every response
//! - Validate the `count` query parameter of batch routes

use axum::extract::rejection::QueryRejection;
use axum::http::HeaderName;
use serde::Deserialize;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::config::BatchConfig;
use crate::http::response::ApiError;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Assigns `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Query string of the `/…/loop` routes.
#[derive(Debug, Default, Deserialize)]
pub struct LoopParams {
    pub count: Option<usize>,
}

/// Resolve the batch size, applying the default and the configured bounds.
pub fn resolve_count(
    params: Result<LoopParams, QueryRejection>,
    batch: &BatchConfig,
) -> Result<usize, ApiError> {
    let params = params.map_err(|e| ApiError::InvalidCount(e.body_text()))?;
    match params.count {
        None => Ok(batch.default_count),
        Some(0) => Err(ApiError::InvalidCount("count must be at least 1".into())),
        Some(n) if n > batch.max_count => Err(ApiError::InvalidCount(format!(
            "count must not exceed {}",
            batch.max_count
        ))),
        Some(n) => Ok(n),
    }
}
