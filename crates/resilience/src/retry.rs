//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Retry schedule for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first call.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Upper bound on any single delay, applied before jitter.
    pub max_delay: Duration,

    /// Growth factor between consecutive delays.
    pub multiplier: f64,

    /// Jitter as a fraction of the delay (0.25 means plus or minus 25%).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.25,
        }
    }
}

impl RetryPolicy {
    /// Computes the jittered delay after the given failed attempt (1-based).
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exp = self.base_delay.as_secs_f64()
            * self.multiplier.powi(failed_attempt.saturating_sub(1) as i32);
        let capped = exp.min(self.max_delay.as_secs_f64());

        let jittered = if self.jitter > 0.0 {
            let factor = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter);
            capped * factor
        } else {
            capped
        };

        Duration::from_secs_f64(jittered.max(0.0))
    }
}
