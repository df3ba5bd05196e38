//! Exponential backoff for collaborator requests.
//!
//! The delay before retry `n` (1-based) is
//! ```text
//! delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=max_jitter)
//! ```
//! Only errors reporting [`ServiceError::is_transient`] are retried.

use crate::errors::ServiceError;
use rand::{Rng, rng};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying.
    pub max_retries: usize,
    /// Initial delay, doubled on every attempt.
    pub base_delay: Duration,
    /// Cap on the exponential part of the delay.
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to each delay.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// Create a policy with the default delay cap (30s) and jitter (250ms).
    ///
    /// # Arguments
    /// * `max_retries` - Retries after the first attempt
    /// * `base_delay` - Delay before the first retry
    pub fn new(max_retries: usize, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Longest time [`RetryPolicy::run`] can take when every attempt runs
    /// into `per_attempt`: all attempts plus every backoff at maximum jitter.
    ///
    /// # Returns
    /// The upper bound a caller-side deadline must allow for the last retry
    /// to still be reachable.
    pub fn worst_case(&self, per_attempt: Duration) -> Duration {
        let attempts = u32::try_from(self.max_retries + 1).unwrap_or(u32::MAX);
        let backoff: Duration = (1..=self.max_retries)
            .map(|attempt| self.backoff_for(attempt) + self.max_jitter)
            .sum();
        per_attempt.saturating_mul(attempts).saturating_add(backoff)
    }

    fn backoff_for(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        self.base_delay.saturating_mul(1u32 << shift).min(self.max_delay)
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let delay = self.backoff_for(attempt);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rng().random_range(0..=jitter_ms))
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let elapsed_ms_total = total_t0.elapsed().as_millis();

                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                operation,
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total,
                                error = %e,
                                "exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
