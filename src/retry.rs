//! Exponential backoff for provider requests.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Backoff settings for provider calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total tries, counting the first request
    pub max_attempts: u32,
    /// Wait before the first retry
    pub initial_delay: Duration,
    /// Cap on any single wait
    pub max_delay: Duration,
    /// Growth factor between consecutive waits
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Translation provider requests: 3 tries, waiting 1s then 2s
    pub fn provider() -> Self {
        Self::new(3, Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_backoff_multiplier(2.0)
    }

    /// Wait before retry number `retry` (1 is the first retry)
    fn backoff(&self, retry: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .powi(retry.saturating_sub(1) as i32);
        Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::provider()
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects the error, or
/// attempts run out. Returns the last error in the latter two cases.
///
/// A `max_attempts` of 0 is treated as 1.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} recovered on try {} of {}", operation_name, attempt, max_attempts);
                }
                return Ok(result);
            }
            Err(e) if !should_retry(&e) => {
                warn!("{} failed permanently: {}", operation_name, e);
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                warn!("{} gave up after {} tries: {}", operation_name, max_attempts, e);
                return Err(e);
            }
            Err(e) => {
                let wait = config.backoff(attempt);
                warn!(
                    "{} try {} of {} failed ({}), retrying in {:?}",
                    operation_name, attempt, max_attempts, e, wait
                );
                sleep(wait).await;
            }
        }
        attempt += 1;
    }
}
