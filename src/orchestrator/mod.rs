//! Orchestrator subsystem.
//!
//! # Responsibilities
//! - Run one call through a chosen strategy and time it
//! - Run N sequential calls and aggregate them in call order
//! - Expose breaker state for observation
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → Orchestrator::single(mode) | Orchestrator::batch(mode, n)
//!     → direct: timeouts::call_with_deadline(upstream)
//!     → breaker: CircuitBreaker::fire()
//!     → retry: RetryPolicy::execute()
//!     → CallReport / BatchReport
//! ```
//!
//! # Design Decisions
//! - The breaker is shared across every request; the orchestrator owns one `Arc`
//! - Batch calls run strictly one after another so breaker evolution is visible
//! - Strategy failures are data, never errors

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::observability::metrics;
use crate::resilience::clock::{elapsed_ms, Clock, TokioClock};
use crate::resilience::timeouts::call_with_deadline;
use crate::resilience::{
    BreakerSnapshot, CallOutcome, CircuitBreaker, LoggingListener, RetryAttempt, RetryPolicy,
};
use crate::upstream::RemoteOperation;

/// Strategy used to reach the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Direct,
    Breaker,
    Retry,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Direct, Mode::Breaker, Mode::Retry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Breaker => "breaker",
            Self::Retry => "retry",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "breaker" => Ok(Self::Breaker),
            "retry" => Ok(Self::Retry),
            other => Err(format!("unknown mode '{other}' (expected direct, breaker or retry)")),
        }
    }
}

/// Timed result of one call through a strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallReport {
    pub mode: Mode,
    pub outcome: CallOutcome,
    /// Retry mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_used: Option<u32>,
    /// Retry mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<RetryAttempt>>,
    pub elapsed_ms: u64,
}

impl CallReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    /// 0-indexed position in the batch.
    pub index: usize,
    #[serde(flatten)]
    pub report: CallReport,
}

/// Aggregate of a sequential batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub mode: Mode,
    pub count: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub results: Vec<BatchEntry>,
}

/// Runs calls through the direct, breaker and retry strategies.
pub struct Orchestrator {
    upstream: Arc<dyn RemoteOperation>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    call_timeout: Duration,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("breaker", &self.breaker)
            .field("retry", &self.retry)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Wire all three strategies to `upstream` from configuration.
    pub fn from_config(config: &AppConfig, upstream: Arc<dyn RemoteOperation>) -> Self {
        Self::from_config_with_clock(config, upstream, Arc::new(TokioClock))
    }

    pub fn from_config_with_clock(
        config: &AppConfig,
        upstream: Arc<dyn RemoteOperation>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let call_timeout = config.upstream.timeout();
        let breaker = CircuitBreaker::builder("upstream", upstream.clone())
            .config(config.breaker)
            .clock(clock.clone())
            .listener(Arc::new(LoggingListener))
            .build();
        let retry = RetryPolicy::new(config.retry, call_timeout, upstream.clone())
            .with_clock(clock.clone());

        Self {
            upstream,
            breaker: Arc::new(breaker),
            retry,
            clock,
            call_timeout,
        }
    }

    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Run one call through `mode`.
    pub async fn single(&self, mode: Mode) -> CallReport {
        let start = self.clock.now();

        let (outcome, attempts) = match mode {
            Mode::Direct => (self.direct().await, None),
            Mode::Breaker => (self.breaker.fire().await, None),
            Mode::Retry => {
                let report = self.retry.execute().await;
                (report.outcome, Some(report.attempts))
            }
        };

        let elapsed_ms = elapsed_ms(self.clock.as_ref(), start);
        let result = outcome.label();
        metrics::record_call(mode.as_str(), &result, elapsed_ms);
        tracing::debug!(mode = %mode, result = %result, elapsed_ms, "Call completed");

        CallReport {
            mode,
            attempts_used: attempts.as_ref().map(|a| a.len() as u32),
            attempts,
            outcome,
            elapsed_ms,
        }
    }

    /// Run `count` calls through `mode`, one after another.
    pub async fn batch(&self, mode: Mode, count: usize) -> BatchReport {
        let start = self.clock.now();
        let mut results = Vec::with_capacity(count);

        for index in 0..count {
            let report = self.single(mode).await;
            results.push(BatchEntry { index, report });
        }

        let succeeded = results.iter().filter(|e| e.report.is_success()).count();
        let elapsed_ms = elapsed_ms(self.clock.as_ref(), start);
        tracing::info!(
            mode = %mode,
            count,
            succeeded,
            failed = count - succeeded,
            elapsed_ms,
            "Batch completed"
        );

        BatchReport {
            mode,
            count,
            succeeded,
            failed: count - succeeded,
            elapsed_ms,
            results,
        }
    }

    async fn direct(&self) -> CallOutcome {
        let start = self.clock.now();
        let result = call_with_deadline(self.upstream.as_ref(), self.call_timeout).await;
        CallOutcome::from_result(result, elapsed_ms(self.clock.as_ref(), start))
    }
}
