//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to upstream:
//!     → timeouts.rs (every attempt has a deadline)
//!     → circuit_breaker.rs (fail fast while the upstream is unhealthy)
//!     → retries.rs (re-invoke with backoff.rs delays until success or budget spent)
//!     → outcome.rs (uniform success / failure result)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Breaker and retry are independent strategies, never stacked
//! - Time comes from an injected clock so behavior is reproducible in tests

pub mod backoff;
pub mod circuit_breaker;
pub mod clock;
pub mod outcome;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{
    BreakerSnapshot, BreakerState, ChannelListener, CircuitBreaker, LoggingListener, Transition,
    TransitionListener,
};
pub use clock::{Clock, ManualClock, TokioClock};
pub use outcome::{CallFailure, CallOutcome, FailureKind};
pub use retries::{RetryAttempt, RetryPolicy, RetryReport};
