//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every upstream call with its deadline
//! - Cancel the in-flight call cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Expiry is an ordinary `Timeout` failure, never a fatal error

use std::time::Duration;

use crate::upstream::{RemoteOperation, UpstreamError, UpstreamResponse};

/// Invoke `operation` and give up after `deadline`.
pub async fn call_with_deadline(
    operation: &dyn RemoteOperation,
    deadline: Duration,
) -> Result<UpstreamResponse, UpstreamError> {
    match tokio::time::timeout(deadline, operation.call(deadline)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(deadline_ms = deadline.as_millis() as u64, "Upstream call timed out");
            Err(UpstreamError::Timeout(deadline))
        }
    }
}
