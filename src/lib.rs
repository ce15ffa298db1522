//! Resilient upstream client library.
//!
//! Calls an unreliable upstream through three strategies (direct, circuit
//! breaker, retry with backoff) and reports timing for single and batch calls.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod resilience;
pub mod upstream;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use orchestrator::{Mode, Orchestrator};
