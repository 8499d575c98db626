/*!
 * Bounded retry with exponential, optionally jittered backoff.
 *
 * Shared by the slugline and scene extraction stages. Whether an error is
 * retried, and whether the policy sleeps first, is decided by
 * `ExtractionError::is_retryable` and `ExtractionError::should_back_off`.
 */

use log::warn;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::app_config::ExtractionCommonConfig;
use crate::errors::ExtractionError;

/// Retry policy for extraction calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Cap for any single delay
    pub max_delay: Duration,
    /// Randomize each delay within `[delay/2, delay]`
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8000),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy from the `extraction.common` config section
    pub fn from_config(config: &ExtractionCommonConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
            jitter: config.jitter,
        }
    }

    /// Policy that never sleeps
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);

        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let millis = delay.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(millis / 2..=millis))
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of attempts
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ExtractionError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ExtractionError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!("{} failed (attempt {}/{}): {}", label, attempt, attempts, e);
                    if e.should_back_off() {
                        let delay = self.backoff_delay(attempt);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
