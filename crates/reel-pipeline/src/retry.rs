//! Retry utilities with exponential backoff.
//!
//! Wraps calls to flaky external generators. The final failing error is
//! returned unchanged after the last attempt.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub initial_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    /// Set the total number of attempts.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Delay before the attempt following failed attempt `attempt_index`.
    fn delay_for_attempt(&self, attempt_index: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt_index));
        delay.min(self.max_delay)
    }
}

/// Execute an async operation with retry logic.
///
/// Runs `operation` up to `config.attempts` times with exponential
/// backoff between attempts. On exhaustion the last error is returned
/// as-is.
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt_index = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt_index + 1 < config.attempts => {
                let delay = config.delay_for_attempt(attempt_index);
                debug!(
                    "{} attempt {} failed, retrying in {:?}: {}",
                    config.operation_name,
                    attempt_index + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt_index += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
