//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! strategy (direct / breaker / retry)
//!     → RemoteOperation::call(deadline)
//!     → client.rs (reqwest GET, deadline enforced per request)
//!     → UpstreamResponse | UpstreamError
//! ```
//!
//! # Design Decisions
//! - One trait at the seam so strategies can be tested with scripted operations
//! - Non-2xx answers are errors here; callers never see raw reqwest errors

pub mod client;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

pub use client::HttpUpstream;

/// A successful upstream answer.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Failure of a single upstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream did not answer within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("connection to upstream failed: {0}")]
    Connection(String),

    #[error("upstream answered with status {0}")]
    Status(u16),
}

/// One call to the upstream service.
#[async_trait]
pub trait RemoteOperation: Send + Sync {
    async fn call(&self, deadline: Duration) -> Result<UpstreamResponse, UpstreamError>;
}

/// Adapts an async closure into a `RemoteOperation`.
pub struct FnOperation<F> {
    f: F,
}

impl<F> FnOperation<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> RemoteOperation for FnOperation<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<UpstreamResponse, UpstreamError>> + Send,
{
    async fn call(&self, _deadline: Duration) -> Result<UpstreamResponse, UpstreamError> {
        (self.f)().await
    }
}

impl<F> std::fmt::Debug for FnOperation<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOperation").field("f", &"<closure>").finish()
    }
}
