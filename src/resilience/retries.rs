//! Retry logic.
//!
//! # Responsibilities
//! - Re-invoke the upstream after each failure, up to `max_attempts`
//! - Wait `base * 2^(n-1) + jitter` between attempts
//! - Report every attempt and the final outcome
//!
//! # Design Decisions
//! - Every failure kind is retryable; the upstream call is a plain GET
//! - Backoff waits go through the injected clock and never block the worker
//! - Jittered backoff prevents thundering herd
//! - Exhaustion wraps the last underlying failure instead of hiding it

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::clock::{elapsed_ms, Clock, TokioClock};
use crate::resilience::outcome::{CallFailure, CallOutcome};
use crate::resilience::timeouts::call_with_deadline;
use crate::upstream::RemoteOperation;

/// One attempt within a retry sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryAttempt {
    /// 1-indexed.
    pub attempt_number: u32,
    /// Backoff waited before this attempt; zero for the first.
    pub delay_before_ms: u64,
    pub outcome: CallOutcome,
}

/// Result of a whole retry sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryReport {
    /// Final outcome, stamped with the elapsed time of the whole sequence.
    pub outcome: CallOutcome,
    pub attempts: Vec<RetryAttempt>,
}

impl RetryReport {
    pub fn attempts_used(&self) -> u32 {
        self.attempts.len() as u32
    }
}

/// Retries one upstream operation with exponential backoff.
#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    call_timeout: Duration,
    operation: Arc<dyn RemoteOperation>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    pub fn new(
        config: RetryConfig,
        call_timeout: Duration,
        operation: Arc<dyn RemoteOperation>,
    ) -> Self {
        Self {
            config,
            call_timeout,
            operation,
            clock: Arc::new(TokioClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn execute(&self) -> RetryReport {
        let max_attempts = self.config.max_attempts.max(1);
        let start = self.clock.now();
        let mut attempts = Vec::with_capacity(max_attempts as usize);
        let mut delay_before = Duration::ZERO;
        let mut attempt_number = 1;

        loop {
            let attempt_start = self.clock.now();
            let result = call_with_deadline(self.operation.as_ref(), self.call_timeout).await;
            let outcome =
                CallOutcome::from_result(result, elapsed_ms(self.clock.as_ref(), attempt_start));
            metrics::record_retry_attempt(outcome.is_success());

            let failure = match &outcome {
                CallOutcome::Success { .. } => None,
                CallOutcome::Failure { error, .. } => Some(error.clone()),
            };
            attempts.push(RetryAttempt {
                attempt_number,
                delay_before_ms: delay_before.as_millis() as u64,
                outcome: outcome.clone(),
            });

            let Some(failure) = failure else {
                if attempt_number > 1 {
                    tracing::info!(attempts = attempt_number, "Upstream call recovered after retry");
                }
                let total = elapsed_ms(self.clock.as_ref(), start);
                return RetryReport {
                    outcome: outcome.with_elapsed(total),
                    attempts,
                };
            };

            if attempt_number >= max_attempts {
                tracing::warn!(
                    attempts = attempt_number,
                    last_error = %failure.kind,
                    "Retries exhausted"
                );
                let total = elapsed_ms(self.clock.as_ref(), start);
                return RetryReport {
                    outcome: CallOutcome::failure(
                        CallFailure::retries_exhausted(attempt_number, failure),
                        total,
                    ),
                    attempts,
                };
            }

            let delay = {
                let mut rng = rand::thread_rng();
                calculate_backoff(
                    attempt_number,
                    self.config.base_delay_ms,
                    self.config.jitter_ms,
                    &mut rng,
                )
            };
            tracing::debug!(
                attempt = attempt_number,
                error = %failure.kind,
                delay_ms = delay.as_millis() as u64,
                "Retrying upstream call"
            );

            self.clock.sleep(delay).await;
            delay_before = delay;
            attempt_number += 1;
        }
    }
}
