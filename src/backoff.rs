//! Delay between attempts: fixed or exponential, blocking.

use std::thread;
use std::time::Duration;

use crate::config::BackoffConfig;

/// Delay strategy consulted between attempts. `attempt` is the 1-based count
/// of failures observed so far; `wait` blocks the calling thread.
pub trait Backoff {
    fn wait(&self, attempt: u32);
}

/// The same delay before every retry.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Backoff for FixedBackoff {
    fn wait(&self, _attempt: u32) {
        thread::sleep(self.delay);
    }
}

/// Exponential backoff with a cap: base * 2^(attempt-1), never above max_delay.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ExponentialBackoff {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(cfg: &BackoffConfig) -> Self {
        Self {
            // NaN and negatives collapse to zero rather than panicking.
            base_delay: Duration::from_secs_f64(cfg.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }

    /// Delay before the attempt after `attempt` failures. Exponent is capped
    /// before shifting so large attempt counts saturate at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(8);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }
}

impl Backoff for ExponentialBackoff {
    fn wait(&self, attempt: u32) {
        thread::sleep(self.delay_for(attempt));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let b = ExponentialBackoff::default();
        let d1 = b.delay_for(1);
        let d2 = b.delay_for(2);
        assert!(d2 >= d1);

        // Very high attempt should cap at max_delay.
        assert!(b.delay_for(40) <= b.max_delay);
        assert_eq!(b.delay_for(40), b.max_delay);
    }

    #[test]
    fn first_retry_uses_base_delay() {
        let b = ExponentialBackoff::default();
        assert_eq!(b.delay_for(1), b.base_delay);
    }

    #[test]
    fn from_config_tolerates_bad_base() {
        let cfg = BackoffConfig {
            base_delay_secs: -1.0,
            max_delay_secs: 10,
        };
        let b = ExponentialBackoff::from_config(&cfg);
        assert_eq!(b.delay_for(1), Duration::ZERO);
    }
}
