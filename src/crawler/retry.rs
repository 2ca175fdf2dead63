//! Exponential backoff with jitter
//!
//! A [`RetryPolicy`] wraps a fallible async operation at its call site. The
//! caller supplies the predicate deciding which errors are worth another
//! attempt; everything else is returned after the first failure.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Upper bound on a single backoff sleep
pub const MAX_BACKOFF: Duration = Duration::from_secs(600);

/// Retry schedule: `retries` extra attempts, delays growing geometrically
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts made after the first one
    pub retries: u32,

    /// Nominal delay before the first retry
    pub initial_delay: Duration,

    /// Multiplier applied to the nominal delay after each retry
    pub backoff_factor: f64,

    /// Each delay is perturbed by up to ± this fraction of itself
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

impl RetryPolicy {
    /// Creates a policy with the default backoff factor (2.0) and no jitter
    pub fn new(retries: u32, initial_delay: Duration) -> Self {
        Self {
            retries,
            initial_delay,
            backoff_factor: 2.0,
            jitter: 0.0,
        }
    }

    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Builds the policy described by the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            retries: config.retries,
            initial_delay: config.initial_delay(),
            backoff_factor: config.backoff_factor,
            jitter: config.jitter,
        }
    }

    /// Total attempts before a retryable error is surfaced
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0-based), without jitter
    pub fn nominal_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }

    /// Delay before retry number `retry`, perturbed by the jitter fraction
    pub fn jittered_delay(&self, retry: u32) -> Duration {
        let nominal = self.nominal_delay(retry).as_secs_f64();
        let spread = nominal * self.jitter;
        let offset = if spread > 0.0 {
            rand::rng().random_range(-spread..=spread)
        } else {
            0.0
        };
        Duration::try_from_secs_f64((nominal + offset).max(0.0)).unwrap_or(Duration::ZERO)
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent
    ///
    /// `op` receives the 1-based attempt number. The last error is returned
    /// unchanged once attempts are exhausted.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, is_retryable: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut retry = 0;
        loop {
            let attempt = retry + 1;
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => return Err(e),
                Err(e) if retry >= self.retries => {
                    tracing::error!(
                        attempts = attempt,
                        error = %e,
                        "Giving up after {} retries",
                        self.retries
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.jittered_delay(retry);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }
}
