//! Outbound call protection for peer service calls.
//!
//! This crate wraps calls to downstream services with a per-target circuit
//! breaker, bounded retries with jittered exponential backoff, and a
//! per-attempt timeout.
//!
//! A guarded call proceeds as follows:
//! 1. The target's breaker admits or fail-fast rejects the call
//! 2. The operation runs with a hard per-attempt deadline
//! 3. Transient failures are retried per policy; rejections return at once
//! 4. One success or failure is recorded against the breaker

pub mod breaker;
pub mod error;
pub mod guard;
pub mod registry;
pub mod retry;

pub use breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use error::{CallError, ResilienceError, Result};
pub use guard::{CallGuard, CallGuardConfig};
pub use registry::GuardRegistry;
pub use retry::RetryPolicy;
