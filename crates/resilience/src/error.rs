//! Resilience error types.

use thiserror::Error;

/// Failure modes of a single guarded call, as classified by the caller.
///
/// The guard retries `Transient` failures and passes `Rejected` straight
/// through; only the caller knows which is which for its own protocol.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// Likely to succeed on retry (timeout, connection reset).
    #[error("transient failure: {0}")]
    Transient(String),

    /// Definitive business rejection; retrying would not change the answer.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl CallError {
    /// Returns true if the error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, CallError::Transient(_))
    }
}

/// Errors returned from a guarded execution.
#[derive(Debug, Clone, Error)]
pub enum ResilienceError {
    /// The circuit for the target is open; no network attempt was made.
    #[error("circuit open for target '{target}'")]
    CircuitOpen { target: String },

    /// All retry attempts failed with transient errors.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The operation returned a definitive rejection.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl ResilienceError {
    /// Returns true if the failure indicates the target itself is unhealthy.
    pub fn is_outage(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }
}

/// Convenience type alias for guarded call results.
pub type Result<T> = std::result::Result<T, ResilienceError>;
