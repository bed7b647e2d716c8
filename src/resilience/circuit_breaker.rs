//! # Circuit Breaker Implementation
//!
//! Provides fault isolation for calls to external dependencies (search index,
//! cache, message broker, order service). The breaker follows the classic
//! three-state pattern: Closed (normal operation), Open (failing fast) and
//! Half-Open (testing recovery), driven by failure and slow-call rates over a
//! count-based sliding window.
//!
//! Phase, window, trial counters and the open timestamp are guarded together by
//! a single short-lived lock. Lifetime counters are atomics outside that lock.
//! The guarded work never runs while the lock is held.

use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::executor;
use crate::resilience::window::{CallOutcome, SlidingWindow};
use crate::resilience::{CircuitBreakerConfig, CircuitBreakerMetrics};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Lock-free lifetime counters for a circuit breaker
#[derive(Debug, Default)]
struct AtomicCircuitBreakerMetrics {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    slow_call_count: AtomicU64,
    not_permitted_count: AtomicU64,
    total_duration_nanos: AtomicU64,
}

impl AtomicCircuitBreakerMetrics {
    #[inline]
    fn record(&self, outcome: &CallOutcome) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        if outcome.is_failure() {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        }
        if outcome.is_slow() {
            self.slow_call_count.fetch_add(1, Ordering::Relaxed);
        }
        self.total_duration_nanos
            .fetch_add(outcome.duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    fn record_not_permitted(&self) {
        self.not_permitted_count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, state: CircuitState, window: WindowSnapshot) -> CircuitBreakerMetrics {
        let total_calls = self.total_calls.load(Ordering::Relaxed);
        let total_duration_nanos = self.total_duration_nanos.load(Ordering::Relaxed);
        let average_duration = if total_calls > 0 {
            Duration::from_nanos(total_duration_nanos / total_calls)
        } else {
            Duration::ZERO
        };

        CircuitBreakerMetrics {
            total_calls,
            success_count: self.success_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            slow_call_count: self.slow_call_count.load(Ordering::Relaxed),
            not_permitted_count: self.not_permitted_count.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(total_duration_nanos),
            average_duration,
            current_state: state,
            buffered_calls: window.buffered_calls,
            failure_rate: window.failure_rate,
            slow_call_rate: window.slow_call_rate,
        }
    }
}

struct WindowSnapshot {
    buffered_calls: usize,
    failure_rate: Option<f32>,
    slow_call_rate: Option<f32>,
}

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - a limited batch of trial calls is allowed
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Errors surfaced by guarded execution without a fallback
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// The breaker denied the call; the work was never invoked
    #[error("Call not permitted: circuit breaker '{component}' is {state}")]
    CallNotPermitted {
        component: String,
        state: CircuitState,
    },

    /// The work ran and failed; the failure was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_call_not_permitted(&self) -> bool {
        matches!(self, CircuitBreakerError::CallNotPermitted { .. })
    }

    /// The original work error, if the work ran
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            CircuitBreakerError::OperationFailed(e) => Some(e),
            CircuitBreakerError::CallNotPermitted { .. } => None,
        }
    }
}

/// Mutable state guarded by the breaker lock
#[derive(Debug)]
struct BreakerState {
    phase: CircuitState,
    /// Bumped on every transition; outcomes from older generations are stale
    generation: u64,
    window: SlidingWindow,
    trial: SlidingWindow,
    half_open_permits: u32,
    opened_at: Option<Instant>,
}

/// Core circuit breaker guarding one named dependency
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    config: CircuitBreakerConfig,

    clock: Arc<dyn Clock>,

    state: Mutex<BreakerState>,

    metrics: AtomicCircuitBreakerMetrics,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Create a circuit breaker reading time from `clock`
    pub fn with_clock(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_rate_threshold = config.failure_rate_threshold(),
            slow_call_rate_threshold = config.slow_call_rate_threshold(),
            sliding_window_size = config.sliding_window_size(),
            minimum_number_of_calls = config.minimum_number_of_calls(),
            wait_duration_ms = config.wait_duration_in_open_state().as_millis() as u64,
            "Circuit breaker initialized"
        );

        let state = BreakerState {
            phase: CircuitState::Closed,
            generation: 0,
            window: SlidingWindow::new(config.sliding_window_size() as usize),
            trial: SlidingWindow::new(
                config.permitted_number_of_calls_in_half_open_state() as usize,
            ),
            half_open_permits: 0,
            opened_at: None,
        };

        Self {
            name,
            config,
            clock,
            state: Mutex::new(state),
            metrics: AtomicCircuitBreakerMetrics::default(),
        }
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        self.state.lock().phase
    }

    /// Current time according to the breaker's clock
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Ask for permission to make one call
    ///
    /// Returns a permit when the call may proceed. The permit must be settled
    /// with [`CallPermit::record`]; dropping it unrecorded releases any
    /// half-open trial slot it occupied.
    pub fn allow(&self) -> Option<CallPermit<'_>> {
        let mut state = self.state.lock();

        let granted = match state.phase {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let waited = state
                    .opened_at
                    .map(|opened| self.clock.now().saturating_duration_since(opened))
                    .unwrap_or(Duration::MAX);

                if waited >= self.config.wait_duration_in_open_state() {
                    self.transition_to(&mut state, CircuitState::HalfOpen);
                    state.half_open_permits = 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if state.half_open_permits
                    < self.config.permitted_number_of_calls_in_half_open_state()
                {
                    state.half_open_permits += 1;
                    true
                } else {
                    false
                }
            }
        };

        if granted {
            Some(CallPermit {
                breaker: self,
                generation: state.generation,
                settled: false,
            })
        } else {
            self.metrics.record_not_permitted();
            debug!(
                component = %self.name,
                state = %state.phase,
                "Call not permitted"
            );
            None
        }
    }

    /// Classify a finished call against the slow-call threshold
    pub fn classify(&self, succeeded: bool, duration: Duration) -> CallOutcome {
        CallOutcome::classify(
            succeeded,
            duration,
            self.config.slow_call_duration_threshold(),
        )
    }

    pub(crate) fn not_permitted_error<E>(&self) -> CircuitBreakerError<E> {
        CircuitBreakerError::CallNotPermitted {
            component: self.name.clone(),
            state: self.state(),
        }
    }

    fn on_outcome(&self, generation: u64, outcome: CallOutcome) {
        self.metrics.record(&outcome);

        debug!(
            component = %self.name,
            outcome = ?outcome.kind,
            duration_ms = outcome.duration.as_millis() as u64,
            "Call outcome recorded"
        );

        let mut state = self.state.lock();
        if generation != state.generation {
            debug!(
                component = %self.name,
                permit_generation = generation,
                current_generation = state.generation,
                "Ignoring outcome from a previous breaker generation"
            );
            return;
        }

        match state.phase {
            CircuitState::Closed => {
                state.window.push(outcome);
                let minimum = self.config.minimum_number_of_calls() as usize;
                if state.window.len() >= minimum && self.exceeds_thresholds(&state.window) {
                    self.transition_to(&mut state, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                state.trial.push(outcome);
                let budget = self.config.permitted_number_of_calls_in_half_open_state() as usize;

                if outcome.is_failure()
                    || (state.trial.len() >= budget && self.exceeds_thresholds(&state.trial))
                {
                    self.transition_to(&mut state, CircuitState::Open);
                } else if state.trial.len() >= budget {
                    self.transition_to(&mut state, CircuitState::Closed);
                }
            }
            CircuitState::Open => {
                // Permits are never issued while open, so the generation check above
                // normally filters these out.
                warn!(component = %self.name, "Outcome recorded while circuit is open");
            }
        }
    }

    fn release(&self, generation: u64) {
        let mut state = self.state.lock();
        if generation == state.generation && state.phase == CircuitState::HalfOpen {
            state.half_open_permits = state.half_open_permits.saturating_sub(1);
            debug!(
                component = %self.name,
                "Half-open trial permit released without an outcome"
            );
        }
    }

    fn exceeds_thresholds(&self, window: &SlidingWindow) -> bool {
        window.failure_rate() >= self.config.failure_rate_threshold()
            || window.slow_call_rate() >= self.config.slow_call_rate_threshold()
    }

    fn transition_to(&self, state: &mut BreakerState, to: CircuitState) {
        let from = state.phase;
        let failure_rate = state.window.failure_rate().max(state.trial.failure_rate());
        let slow_call_rate = state.window.slow_call_rate().max(state.trial.slow_call_rate());

        state.phase = to;
        state.generation += 1;
        state.window.clear();
        state.trial.clear();
        state.half_open_permits = 0;
        state.opened_at = match to {
            CircuitState::Open => Some(self.clock.now()),
            _ => None,
        };

        match to {
            CircuitState::Open => error!(
                component = %self.name,
                from = %from,
                failure_rate = failure_rate,
                slow_call_rate = slow_call_rate,
                wait_duration_ms = self.config.wait_duration_in_open_state().as_millis() as u64,
                "Circuit breaker opened (failing fast)"
            ),
            CircuitState::HalfOpen => info!(
                component = %self.name,
                permitted_calls = self.config.permitted_number_of_calls_in_half_open_state(),
                "Circuit breaker half-open (testing recovery)"
            ),
            CircuitState::Closed => info!(
                component = %self.name,
                from = %from,
                total_calls = self.metrics.total_calls.load(Ordering::Relaxed),
                "Circuit breaker closed (recovered)"
            ),
        }
    }

    /// Force circuit to open state (for emergency situations)
    ///
    /// The open-state wait starts now; afterwards the breaker probes recovery
    /// as usual.
    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        let mut state = self.state.lock();
        self.transition_to(&mut state, CircuitState::Open);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        let mut state = self.state.lock();
        self.transition_to(&mut state, CircuitState::Closed);
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let (phase, window) = {
            let state = self.state.lock();
            let evaluated = state.window.len() >= self.config.minimum_number_of_calls() as usize;
            (
                state.phase,
                WindowSnapshot {
                    buffered_calls: state.window.len(),
                    failure_rate: evaluated.then(|| state.window.failure_rate()),
                    slow_call_rate: evaluated.then(|| state.window.slow_call_rate()),
                },
            )
        };
        self.metrics.snapshot(phase, window)
    }

    /// Check if circuit is healthy (closed state with low failure rate)
    pub fn is_healthy(&self) -> bool {
        self.metrics().is_healthy()
    }

    /// Execute an async operation with circuit breaker protection
    ///
    /// Equivalent to [`executor::execute_async`].
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        executor::execute_async(self, operation).await
    }
}

/// Permission to make one call through a [`CircuitBreaker`]
#[must_use = "a permit must be recorded, or dropped to release it"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl CallPermit<'_> {
    /// Record the outcome of the permitted call
    pub fn record(mut self, outcome: CallOutcome) {
        self.settled = true;
        self.breaker.on_outcome(self.generation, outcome);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.generation);
        }
    }
}
