//! Guarded execution combining circuit breaker, retry, and timeout.

use std::future::Future;
use std::time::Duration;

use crate::breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::error::{CallError, ResilienceError, Result};
use crate::retry::RetryPolicy;

/// Configuration for one guarded target.
#[derive(Debug, Clone)]
pub struct CallGuardConfig {
    /// Circuit breaker settings.
    pub breaker: CircuitBreakerConfig,

    /// Retry schedule for transient failures.
    pub retry: RetryPolicy,

    /// Hard deadline for a single attempt.
    pub call_timeout: Duration,
}

impl Default for CallGuardConfig {
    fn default() -> Self {
        Self {
            breaker: CircuitBreakerConfig::default(),
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Protects calls to one downstream target.
///
/// Admission is decided once per `execute`; retries happen inside that
/// admission, and exactly one success or failure is recorded against the
/// breaker per execution. Fail-fast rejections record nothing.
pub struct CallGuard {
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    call_timeout: Duration,
}

impl CallGuard {
    /// Creates a guard for the named target.
    pub fn new(target: impl Into<String>, config: CallGuardConfig) -> Self {
        Self {
            breaker: CircuitBreaker::new(target, config.breaker),
            retry: config.retry,
            call_timeout: config.call_timeout,
        }
    }

    /// Returns the target this guard protects.
    pub fn target(&self) -> &str {
        self.breaker.target()
    }

    /// Returns the current circuit state.
    pub async fn circuit_state(&self) -> CircuitState {
        self.breaker.state().await
    }

    /// Runs the operation under breaker, retry, and timeout protection.
    ///
    /// Transient failures and per-attempt timeouts are retried per policy;
    /// a definitive rejection returns immediately. The rejection still counts
    /// as breaker success since the target answered.
    #[tracing::instrument(skip(self, operation), fields(target = %self.target()))]
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, CallError>>,
    {
        if !self.breaker.try_acquire().await {
            return Err(ResilienceError::CircuitOpen {
                target: self.target().to_string(),
            });
        }

        let mut last_error = String::new();
        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 {
                let delay = self.retry.delay_for(attempt - 1);
                tracing::debug!(
                    target = %self.target(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }

            match tokio::time::timeout(self.call_timeout, operation()).await {
                Ok(Ok(value)) => {
                    self.breaker.record_success().await;
                    if attempt > 1 {
                        tracing::info!(target = %self.target(), attempt, "call succeeded on retry");
                    }
                    return Ok(value);
                }
                Ok(Err(CallError::Rejected(reason))) => {
                    self.breaker.record_success().await;
                    return Err(ResilienceError::Rejected(reason));
                }
                Ok(Err(CallError::Transient(reason))) => {
                    last_error = reason;
                }
                Err(_) => {
                    last_error = format!("timed out after {:?}", self.call_timeout);
                    metrics::counter!("call_timeouts_total").increment(1);
                }
            }

            tracing::warn!(
                target = %self.target(),
                attempt,
                max_attempts = self.retry.max_attempts,
                error = %last_error,
                "call attempt failed"
            );
        }

        self.breaker.record_failure().await;
        metrics::counter!("retries_exhausted_total").increment(1);
        Err(ResilienceError::RetriesExhausted {
            attempts: self.retry.max_attempts,
            last_error,
        })
    }
}
