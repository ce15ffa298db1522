//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware: request ID, tracing, timeout)
//!     → request.rs (request ID layers, `count` query validation)
//!     → Orchestrator (direct / breaker / retry)
//!     → response.rs (JSON body, status mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
