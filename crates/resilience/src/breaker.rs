//! Per-target circuit breaker.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,

    /// Failure threshold exceeded, calls fail fast.
    Open,

    /// Cool-down elapsed, a single trial call probes the target.
    HalfOpen,
}

impl CircuitState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for a circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures within the window that trip the circuit.
    pub failure_threshold: u32,

    /// Rolling window in which failures are counted.
    pub failure_window: Duration,

    /// Time to wait in open state before admitting a trial call.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window: Duration::from_secs(60),
            cooldown: Duration::from_secs(60),
        }
    }
}

struct Inner {
    state: CircuitState,
    failures: VecDeque<Instant>,
    opened_at: Option<Instant>,
    probe_started_at: Option<Instant>,
}

/// Circuit breaker guarding one downstream target.
///
/// All state lives behind a single lock held only for counter updates and
/// state transitions, never across a network call.
pub struct CircuitBreaker {
    target: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Creates a new closed breaker for the named target.
    pub fn new(target: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            target: target.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failures: VecDeque::new(),
                opened_at: None,
                probe_started_at: None,
            }),
        }
    }

    /// Returns the target this breaker guards.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the current state.
    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Asks for admission of one call.
    ///
    /// Returns false when the circuit rejects the call without a network
    /// attempt. An open circuit past its cool-down moves to half-open and
    /// admits exactly one trial; further callers are rejected until the
    /// trial reports back.
    pub async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.cooldown);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_started_at = Some(Instant::now());
                    tracing::info!(target = %self.target, "circuit half-open, admitting trial call");
                    true
                } else {
                    metrics::counter!("circuit_rejections_total").increment(1);
                    false
                }
            }
            CircuitState::HalfOpen => {
                // A probe whose caller went away never reports back; admit a
                // replacement trial once a full cool-down has passed.
                let probe_stale = inner
                    .probe_started_at
                    .is_none_or(|at| at.elapsed() >= self.config.cooldown);
                if probe_stale {
                    inner.probe_started_at = Some(Instant::now());
                    true
                } else {
                    metrics::counter!("circuit_rejections_total").increment(1);
                    false
                }
            }
        }
    }

    /// Records the outcome of one admitted call as a success.
    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed => inner.failures.clear(),
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.failures.clear();
                inner.opened_at = None;
                inner.probe_started_at = None;
                tracing::info!(target = %self.target, "circuit closed after successful trial");
            }
            // Late result from a call admitted before the trip; the next
            // trial decides recovery.
            CircuitState::Open => {}
        }
    }

    /// Records the outcome of one admitted call as a failure.
    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        match inner.state {
            CircuitState::Closed => {
                inner.failures.push_back(now);
                while inner
                    .failures
                    .front()
                    .is_some_and(|at| now.duration_since(*at) > self.config.failure_window)
                {
                    inner.failures.pop_front();
                }
                let count = inner.failures.len() as u32;
                if count >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(now);
                    inner.failures.clear();
                    metrics::counter!("circuit_opened_total").increment(1);
                    tracing::warn!(
                        target = %self.target,
                        failures = count,
                        "circuit opened after consecutive failures"
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
                inner.probe_started_at = None;
                metrics::counter!("circuit_opened_total").increment(1);
                tracing::warn!(target = %self.target, "trial call failed, circuit re-opened");
            }
            CircuitState::Open => {}
        }
    }
}
