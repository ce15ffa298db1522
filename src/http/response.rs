//! Response shaping.
//!
//! # Responsibilities
//! - Serialize reports as JSON
//! - Map call outcomes to HTTP status codes
//! - Render client errors as a JSON body
//!
//! # Design Decisions
//! - Open circuit → 503, upstream timeout → 504, any other failure → 502
//! - Batch routes answer 200; per-call results live in the body

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::orchestrator::CallReport;
use crate::resilience::{CallOutcome, FailureKind};

/// Errors returned to HTTP clients before any upstream call is made.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid count: {0}")]
    InvalidCount(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidCount(_) => "invalid_count",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// HTTP status for a single-call outcome.
pub fn status_for(outcome: &CallOutcome) -> StatusCode {
    match outcome.failure_kind() {
        None => StatusCode::OK,
        Some(FailureKind::CircuitOpen) => StatusCode::SERVICE_UNAVAILABLE,
        Some(FailureKind::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        Some(_) => StatusCode::BAD_GATEWAY,
    }
}

pub fn single_response(report: CallReport) -> Response {
    (status_for(&report.outcome), Json(report)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CallFailure;

    fn failed(kind: FailureKind) -> CallOutcome {
        CallOutcome::failure(CallFailure::new(kind, "x"), 1)
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&failed(FailureKind::CircuitOpen)), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(&failed(FailureKind::Timeout)), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(&failed(FailureKind::ConnectionError)), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&failed(FailureKind::UpstreamStatus(404))), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&failed(FailureKind::RetriesExhausted)), StatusCode::BAD_GATEWAY);
    }
}
