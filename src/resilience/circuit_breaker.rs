//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: testing if upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: window calls >= minimum_calls and failure rate >= threshold
//! Open → Half-Open: reset timeout elapsed (evaluated on the next call)
//! Half-Open → Closed: probe call succeeds
//! Half-Open → Open: probe call fails (timer restarts)
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream, built once and injected where needed
//! - Fail fast in Open state (no upstream call, no waiting)
//! - Single probe in Half-Open (prevents hammering a recovering upstream)
//! - State and stats share one mutex that is never held across an await
//! - Every transition bumps an epoch; results admitted under an older epoch
//!   are returned to their caller but not counted

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::BreakerConfig;
use crate::observability::metrics;
use crate::resilience::clock::{elapsed_ms, Clock, TokioClock};
use crate::resilience::outcome::{CallFailure, CallOutcome};
use crate::resilience::timeouts::call_with_deadline;
use crate::upstream::RemoteOperation;

/// Current state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Outcomes of the most recent calls observed while Closed.
#[derive(Debug, Clone)]
pub struct RollingStats {
    window: VecDeque<bool>,
    capacity: usize,
    failures: usize,
}

impl RollingStats {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    pub fn record(&mut self, success: bool) {
        if self.window.len() == self.capacity {
            if let Some(false) = self.window.pop_front() {
                self.failures -= 1;
            }
        }
        self.window.push_back(success);
        if !success {
            self.failures += 1;
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.failures = 0;
    }

    pub fn calls(&self) -> usize {
        self.window.len()
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn failure_rate_percent(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.failures as f64 * 100.0 / self.window.len() as f64
        }
    }

    /// True once the sample is large enough and the failure rate has
    /// reached `threshold_percent`.
    pub fn exceeds(&self, threshold_percent: u32, minimum_calls: usize) -> bool {
        let calls = self.calls();
        calls >= minimum_calls.max(1)
            && (self.failures as u64) * 100 >= u64::from(threshold_percent) * calls as u64
    }
}

/// A state change, delivered to every registered listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub circuit: String,
    pub from: BreakerState,
    pub to: BreakerState,
    /// Failure rate of the window at the moment of the transition.
    pub failure_rate_percent: f64,
}

/// Receives breaker transitions. Called outside the state lock; must not block.
pub trait TransitionListener: Send + Sync {
    fn on_transition(&self, transition: &Transition);
}

impl<F> TransitionListener for F
where
    F: Fn(&Transition) + Send + Sync,
{
    fn on_transition(&self, transition: &Transition) {
        self(transition)
    }
}

/// Logs transitions and counts them in metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl TransitionListener for LoggingListener {
    fn on_transition(&self, t: &Transition) {
        match t.to {
            BreakerState::Open => tracing::warn!(
                circuit = %t.circuit,
                from = %t.from,
                failure_rate = t.failure_rate_percent,
                "Circuit opened"
            ),
            BreakerState::HalfOpen => {
                tracing::info!(circuit = %t.circuit, "Circuit half-open, probing upstream")
            }
            BreakerState::Closed => tracing::info!(circuit = %t.circuit, "Circuit closed"),
        }
        metrics::record_breaker_transition(&t.circuit, t.to);
    }
}

/// Forwards transitions into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<Transition>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Transition>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TransitionListener for ChannelListener {
    fn on_transition(&self, transition: &Transition) {
        // A dropped receiver just means nobody is watching.
        let _ = self.tx.send(transition.clone());
    }
}

/// Read-only view of a breaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub window_calls: usize,
    pub window_failures: usize,
    pub failure_rate_percent: f64,
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    stats: RollingStats,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
    epoch: u64,
}

/// Circuit breaker wrapping a single upstream operation.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    operation: Arc<dyn RemoteOperation>,
    clock: Arc<dyn Clock>,
    listeners: Vec<Arc<dyn TransitionListener>>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .field("inner", &self.inner)
            .finish()
    }
}

/// Admission to call the upstream. A probe permit that is dropped without
/// being settled (the caller's future was cancelled) frees the probe slot.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    epoch: u64,
    probe: bool,
    settled: bool,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.probe && !self.settled {
            self.breaker.release_probe(self.epoch);
        }
    }
}

impl CircuitBreaker {
    pub fn builder(
        name: impl Into<String>,
        operation: Arc<dyn RemoteOperation>,
    ) -> CircuitBreakerBuilder {
        CircuitBreakerBuilder::new(name, operation)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Run one call through the breaker.
    pub async fn fire(&self) -> CallOutcome {
        let start = self.clock.now();
        let (permit, transition) = self.admit(start);
        self.notify(transition);

        let Some(mut permit) = permit else {
            tracing::debug!(circuit = %self.name, "Call rejected, circuit open");
            metrics::record_breaker_rejection(&self.name);
            return CallOutcome::failure(
                CallFailure::circuit_open(&self.name),
                elapsed_ms(self.clock.as_ref(), start),
            );
        };

        let result = call_with_deadline(self.operation.as_ref(), self.config.timeout()).await;
        let transition = self.settle(&mut permit, result.is_ok());
        self.notify(transition);

        CallOutcome::from_result(result, elapsed_ms(self.clock.as_ref(), start))
    }

    /// Current state, after applying an elapsed reset timer.
    pub fn state(&self) -> BreakerState {
        self.snapshot().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = self.clock.now();
        let (snapshot, transition) = {
            let mut inner = self.lock();
            let transition = self.promote_if_due(&mut inner, now);
            let snapshot = BreakerSnapshot {
                name: self.name.clone(),
                state: inner.state,
                window_calls: inner.stats.calls(),
                window_failures: inner.stats.failures(),
                failure_rate_percent: inner.stats.failure_rate_percent(),
            };
            (snapshot, transition)
        };
        self.notify(transition);
        snapshot
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn admit(&self, now: Instant) -> (Option<Permit<'_>>, Option<Transition>) {
        let mut inner = self.lock();
        let transition = self.promote_if_due(&mut inner, now);

        let probe = match inner.state {
            BreakerState::Closed => false,
            BreakerState::Open => return (None, transition),
            BreakerState::HalfOpen if inner.probe_in_flight => return (None, transition),
            BreakerState::HalfOpen => {
                inner.probe_in_flight = true;
                true
            }
        };

        let permit = Permit {
            breaker: self,
            epoch: inner.epoch,
            probe,
            settled: false,
        };
        (Some(permit), transition)
    }

    fn settle(&self, permit: &mut Permit<'_>, success: bool) -> Option<Transition> {
        permit.settled = true;
        let now = self.clock.now();
        let mut inner = self.lock();

        if inner.epoch != permit.epoch {
            tracing::debug!(
                circuit = %self.name,
                state = %inner.state,
                success,
                "Ignoring result admitted before the last transition"
            );
            return None;
        }

        match inner.state {
            BreakerState::Closed => {
                inner.stats.record(success);
                if inner
                    .stats
                    .exceeds(self.config.error_threshold_percent, self.config.minimum_calls)
                {
                    Some(self.transition(&mut inner, BreakerState::Open, now))
                } else {
                    None
                }
            }
            BreakerState::HalfOpen => {
                let to = if success {
                    BreakerState::Closed
                } else {
                    BreakerState::Open
                };
                Some(self.transition(&mut inner, to, now))
            }
            BreakerState::Open => None,
        }
    }

    fn release_probe(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch == epoch && inner.state == BreakerState::HalfOpen {
            tracing::debug!(circuit = %self.name, "Probe abandoned, releasing slot");
            inner.probe_in_flight = false;
        }
    }

    fn promote_if_due(&self, inner: &mut Inner, now: Instant) -> Option<Transition> {
        if inner.state != BreakerState::Open {
            return None;
        }
        let due = inner
            .opened_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.config.reset_timeout());
        due.then(|| self.transition(inner, BreakerState::HalfOpen, now))
    }

    fn transition(&self, inner: &mut Inner, to: BreakerState, now: Instant) -> Transition {
        let transition = Transition {
            circuit: self.name.clone(),
            from: inner.state,
            to,
            failure_rate_percent: inner.stats.failure_rate_percent(),
        };

        inner.state = to;
        inner.epoch += 1;
        inner.probe_in_flight = false;
        match to {
            BreakerState::Open => inner.opened_at = Some(now),
            BreakerState::HalfOpen => inner.stats.reset(),
            BreakerState::Closed => {
                inner.stats.reset();
                inner.opened_at = None;
            }
        }
        transition
    }

    fn notify(&self, transition: Option<Transition>) {
        let Some(transition) = transition else {
            return;
        };
        for listener in &self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener.on_transition(&transition))).is_err() {
                tracing::error!(
                    circuit = %self.name,
                    to = %transition.to,
                    "Transition listener panicked"
                );
            }
        }
    }
}

/// Builder for `CircuitBreaker`.
pub struct CircuitBreakerBuilder {
    name: String,
    config: BreakerConfig,
    operation: Arc<dyn RemoteOperation>,
    clock: Arc<dyn Clock>,
    listeners: Vec<Arc<dyn TransitionListener>>,
}

impl CircuitBreakerBuilder {
    pub fn new(name: impl Into<String>, operation: Arc<dyn RemoteOperation>) -> Self {
        Self {
            name: name.into(),
            config: BreakerConfig::default(),
            operation,
            clock: Arc::new(TokioClock),
            listeners: Vec::new(),
        }
    }

    pub fn config(mut self, config: BreakerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a listener for state transitions.
    pub fn listener(mut self, listener: Arc<dyn TransitionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker {
            name: self.name,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                stats: RollingStats::new(self.config.window_size),
                opened_at: None,
                probe_in_flight: false,
                epoch: 0,
            }),
            config: self.config,
            operation: self.operation,
            clock: self.clock,
            listeners: self.listeners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::clock::ManualClock;
    use crate::resilience::outcome::FailureKind;
    use crate::upstream::{FnOperation, UpstreamError, UpstreamResponse};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn ok() -> Result<UpstreamResponse, UpstreamError> {
        Ok(UpstreamResponse {
            status: 200,
            body: json!({"ok": true}),
        })
    }

    fn err() -> Result<UpstreamResponse, UpstreamError> {
        Err(UpstreamError::Status(500))
    }

    /// Operation answering from a script of success flags; succeeds once the
    /// script runs out. Counts invocations.
    fn scripted(script: Vec<bool>) -> (Arc<dyn RemoteOperation>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let script = Arc::new(script);
        let op = FnOperation::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let success = script.get(n).copied().unwrap_or(true);
            async move {
                if success {
                    ok()
                } else {
                    err()
                }
            }
        });
        (Arc::new(op), calls)
    }

    fn config(minimum_calls: usize) -> BreakerConfig {
        BreakerConfig {
            timeout_ms: 1000,
            error_threshold_percent: 50,
            reset_timeout_ms: 5000,
            minimum_calls,
            window_size: 10,
        }
    }

    fn breaker(
        op: Arc<dyn RemoteOperation>,
        minimum_calls: usize,
        clock: &ManualClock,
    ) -> CircuitBreaker {
        CircuitBreaker::builder("upstream", op)
            .config(config(minimum_calls))
            .clock(Arc::new(clock.clone()))
            .build()
    }

    #[test]
    fn test_rolling_stats_window_slides() {
        let mut stats = RollingStats::new(3);
        stats.record(false);
        stats.record(false);
        stats.record(true);
        assert_eq!((stats.calls(), stats.failures()), (3, 2));

        stats.record(true);
        stats.record(true);
        assert_eq!((stats.calls(), stats.failures()), (3, 0));
        assert_eq!(stats.failure_rate_percent(), 0.0);
    }

    #[test]
    fn test_rolling_stats_threshold_needs_minimum_sample() {
        let mut stats = RollingStats::new(10);
        stats.record(false);
        assert!(!stats.exceeds(50, 4));

        stats.record(true);
        stats.record(true);
        stats.record(false);
        assert!(stats.exceeds(50, 4));
        assert!(!stats.exceeds(51, 4));
    }

    #[tokio::test]
    async fn test_opens_at_threshold_and_rejects_without_calling() {
        let clock = ManualClock::new();
        let (op, calls) = scripted(vec![true, false, true, false]);
        let cb = breaker(op, 4, &clock);

        for _ in 0..4 {
            cb.fire().await;
        }
        assert_eq!(cb.state(), BreakerState::Open);

        let outcome = cb.fire().await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::CircuitOpen));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_stays_closed_below_minimum_sample() {
        let clock = ManualClock::new();
        let (op, _) = scripted(vec![false; 5]);
        let cb = breaker(op, 5, &clock);

        for _ in 0..4 {
            cb.fire().await;
        }
        assert_eq!(cb.state(), BreakerState::Closed);

        cb.fire().await;
        assert_eq!(cb.state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn test_probe_allowed_only_after_reset_timeout() {
        let clock = ManualClock::new();
        let (op, calls) = scripted(vec![false]);
        let cb = breaker(op, 1, &clock);

        cb.fire().await;
        assert_eq!(cb.state(), BreakerState::Open);

        clock.advance(Duration::from_millis(4999));
        let rejected = cb.fire().await;
        assert_eq!(rejected.failure_kind(), Some(FailureKind::CircuitOpen));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_millis(2));
        let probe = cb.fire().await;
        assert!(probe.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_failed_probe_reopens_and_restarts_timer() {
        let clock = ManualClock::new();
        let (op, calls) = scripted(vec![false, false]);
        let cb = breaker(op, 1, &clock);

        cb.fire().await;
        clock.advance(Duration::from_millis(5000));
        let probe = cb.fire().await;
        assert_eq!(probe.failure_kind(), Some(FailureKind::UpstreamStatus(500)));
        assert_eq!(cb.state(), BreakerState::Open);

        clock.advance(Duration::from_millis(4999));
        assert_eq!(cb.fire().await.failure_kind(), Some(FailureKind::CircuitOpen));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        clock.advance(Duration::from_millis(1));
        assert!(cb.fire().await.is_success());
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_allows_single_probe() {
        let clock = ManualClock::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());

        let (counter, started_tx, gate_rx) = (calls.clone(), started.clone(), gate.clone());
        let op = FnOperation::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let (started, gate) = (started_tx.clone(), gate_rx.clone());
            async move {
                if n == 0 {
                    return err();
                }
                started.notify_one();
                gate.notified().await;
                ok()
            }
        });
        let cb = Arc::new(breaker(Arc::new(op), 1, &clock));

        cb.fire().await;
        clock.advance(Duration::from_millis(5000));

        let probe = tokio::spawn({
            let cb = cb.clone();
            async move { cb.fire().await }
        });
        started.notified().await;
        assert_eq!(cb.state(), BreakerState::HalfOpen);

        let second = cb.fire().await;
        assert_eq!(second.failure_kind(), Some(FailureKind::CircuitOpen));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        gate.notify_one();
        assert!(probe.await.unwrap().is_success());
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_cancelled_probe_releases_slot() {
        let clock = ManualClock::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(Notify::new());

        let (counter, started_tx) = (calls.clone(), started.clone());
        let op = FnOperation::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let started = started_tx.clone();
            async move {
                match n {
                    0 => err(),
                    1 => {
                        started.notify_one();
                        std::future::pending().await
                    }
                    _ => ok(),
                }
            }
        });
        let cb = breaker(Arc::new(op), 1, &clock);

        cb.fire().await;
        clock.advance(Duration::from_millis(5000));

        {
            let probe = cb.fire();
            tokio::pin!(probe);
            tokio::select! {
                _ = &mut probe => panic!("probe should still be pending"),
                _ = started.notified() => {}
            }
        }
        assert_eq!(cb.state(), BreakerState::HalfOpen);

        assert!(cb.fire().await.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_result_from_before_transition_is_not_counted() {
        let clock = ManualClock::new();
        let started = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let (counter, started_tx, gate_rx) = (calls.clone(), started.clone(), gate.clone());
        let op = FnOperation::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let (started, gate) = (started_tx.clone(), gate_rx.clone());
            async move {
                if n == 0 {
                    started.notify_one();
                    gate.notified().await;
                    ok()
                } else {
                    err()
                }
            }
        });
        let cb = Arc::new(breaker(Arc::new(op), 1, &clock));

        let slow = tokio::spawn({
            let cb = cb.clone();
            async move { cb.fire().await }
        });
        started.notified().await;

        cb.fire().await;
        assert_eq!(cb.state(), BreakerState::Open);

        gate.notify_one();
        assert!(slow.await.unwrap().is_success());

        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, BreakerState::Open);
        assert_eq!((snapshot.window_calls, snapshot.window_failures), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let op = FnOperation::new(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            ok()
        });
        let cb = CircuitBreaker::builder("slow", Arc::new(op))
            .config(BreakerConfig {
                timeout_ms: 100,
                minimum_calls: 1,
                ..config(1)
            })
            .build();

        let outcome = cb.fire().await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Timeout));
        assert_eq!(cb.state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn test_listeners_receive_every_transition() {
        let clock = ManualClock::new();
        let (op, _) = scripted(vec![false]);
        let (listener, mut rx) = ChannelListener::new();
        let cb = CircuitBreaker::builder("upstream", op)
            .config(config(1))
            .clock(Arc::new(clock.clone()))
            .listener(Arc::new(listener))
            .build();

        cb.fire().await;
        clock.advance(Duration::from_millis(5000));
        cb.fire().await;

        let seen: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|t| (t.from, t.to))
            .collect();
        assert_eq!(
            seen,
            vec![
                (BreakerState::Closed, BreakerState::Open),
                (BreakerState::Open, BreakerState::HalfOpen),
                (BreakerState::HalfOpen, BreakerState::Closed),
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_listener_is_contained() {
        let clock = ManualClock::new();
        let (op, _) = scripted(vec![false]);
        let cb = CircuitBreaker::builder("upstream", op)
            .config(config(1))
            .clock(Arc::new(clock.clone()))
            .listener(Arc::new(|_: &Transition| panic!("listener bug")))
            .build();

        let outcome = cb.fire().await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::UpstreamStatus(500)));
        assert_eq!(cb.state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn test_identical_config_yields_identical_trajectory() {
        let script = vec![true, false, false, true, false, false, true, true, false, true];

        let mut trajectories = Vec::new();
        for _ in 0..2 {
            let clock = ManualClock::new();
            let (op, _) = scripted(script.clone());
            let cb = breaker(op, 3, &clock);

            let mut states = Vec::new();
            for _ in 0..script.len() {
                cb.fire().await;
                states.push(cb.state());
                clock.advance(Duration::from_millis(1500));
            }
            trajectories.push(states);
        }

        assert_eq!(trajectories[0], trajectories[1]);
        assert!(trajectories[0].contains(&BreakerState::Open));
    }
}
