//! Retry logic for failed pipeline runs.
//!
//! Provides a configurable retry policy with:
//! - A fixed attempt ceiling
//! - Fixed or linearly-increasing delay between attempts
//! - Terminal-vs-retryable classification via the [`Retryable`] trait
//! - Optional user notification on retry
//!
//! The classifier decides; this module never inspects error messages.

use crate::telegram::Bot;
use std::future::Future;
use std::time::Duration;
use teloxide::prelude::*;
use thiserror::Error;

/// Retry-related errors.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All attempts exhausted (or a terminal error stopped the loop early)
    #[error("gave up after {attempts} attempt(s)")]
    Exhausted { attempts: u32, last_error: E },
}

impl<E> RetryError<E> {
    /// The error from the last attempt.
    pub fn last_error(&self) -> &E {
        match self {
            RetryError::Exhausted { last_error, .. } => last_error,
        }
    }

    /// Consumes the wrapper, returning the last attempt's error.
    pub fn into_last_error(self) -> E {
        match self {
            RetryError::Exhausted { last_error, .. } => last_error,
        }
    }
}

/// Retry policy configuration.
///
/// `delay_step = 0` gives a fixed delay between attempts; a non-zero step
/// grows the delay linearly, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempt ceiling, including the first attempt
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Linear increment added per completed attempt
    pub delay_step: Duration,
    /// Cap on the computed delay
    pub max_delay: Duration,
    /// Whether to add up to 25% random jitter to delays
    pub add_jitter: bool,
    /// Whether to notify the user when a retry starts
    pub notify_user: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            delay_step: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            add_jitter: false,
            notify_user: true,
        }
    }
}

impl RetryConfig {
    /// Creates a retry config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total attempt ceiling.
    #[must_use]
    pub fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the per-attempt linear increment.
    #[must_use]
    pub fn delay_step(mut self, step: Duration) -> Self {
        self.delay_step = step;
        self
    }

    /// Sets the delay cap.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables jitter.
    #[must_use]
    pub fn with_jitter(mut self) -> Self {
        self.add_jitter = true;
        self
    }

    /// Disables user notifications.
    #[must_use]
    pub fn no_notify(mut self) -> Self {
        self.notify_user = false;
        self
    }

    /// Config for unit tests and other hot loops: short fixed delays.
    pub fn quick() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            delay_step: Duration::ZERO,
            max_delay: Duration::from_millis(50),
            add_jitter: false,
            notify_user: false,
        }
    }

    /// Delay after the n-th failed attempt (1-based), growing linearly.
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let step_count = attempt.saturating_sub(1);
        let base = self.initial_delay + self.delay_step * step_count;
        let capped = base.min(self.max_delay);

        if self.add_jitter {
            let jitter = rand::random::<f64>() * 0.25 * capped.as_secs_f64();
            capped + Duration::from_secs_f64(jitter)
        } else {
            capped
        }
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error)
    pub result: Result<T, RetryError<E>>,
    /// Number of attempts made
    pub attempts: u32,
    /// Total time spent, delays included
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    /// Returns true if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns true if the loop gave up.
    pub fn is_exhausted(&self) -> bool {
        self.result.is_err()
    }
}

/// Determines if an error is worth another attempt.
pub trait Retryable {
    /// Returns true if the error should be retried.
    fn is_retryable(&self) -> bool;

    /// Optional delay hint (e.g. from rate limit headers).
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

// Retryable impls for the error types the pipeline produces

impl Retryable for teloxide::RequestError {
    fn is_retryable(&self) -> bool {
        match self {
            teloxide::RequestError::Network(_) => true,
            teloxide::RequestError::RetryAfter(_) => true,
            teloxide::RequestError::Io(_) => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        if let teloxide::RequestError::RetryAfter(seconds) = self {
            Some(seconds.duration())
        } else {
            None
        }
    }
}

impl Retryable for std::io::Error {
    fn is_retryable(&self) -> bool {
        use std::io::ErrorKind;
        matches!(
            self.kind(),
            ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::TimedOut
                | ErrorKind::Interrupted
                | ErrorKind::WouldBlock
        )
    }
}

impl Retryable for crate::core::error::AppError {
    fn is_retryable(&self) -> bool {
        !self.is_terminal()
    }

    fn retry_after(&self) -> Option<Duration> {
        if let crate::core::error::AppError::Upload(e) = self {
            e.retry_after()
        } else {
            None
        }
    }
}

/// Executes an async operation under the retry policy.
///
/// Terminal errors (per [`Retryable::is_retryable`]) stop the loop on the
/// attempt that produced them; retryable errors are re-attempted until the
/// ceiling. Exactly `max_attempts` attempts happen in the worst case.
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Debug,
{
    let start = std::time::Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => {
                return RetryResult {
                    result: Ok(value),
                    attempts,
                    total_duration: start.elapsed(),
                };
            }
            Err(e) if attempts < config.max_attempts && e.is_retryable() => {
                let delay = e.retry_after().unwrap_or_else(|| config.delay_after_attempt(attempts));
                log::warn!(
                    "Attempt {}/{} failed (retrying in {:?}): {:?}",
                    attempts,
                    config.max_attempts,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return RetryResult {
                    result: Err(RetryError::Exhausted {
                        attempts,
                        last_error: e,
                    }),
                    attempts,
                    total_duration: start.elapsed(),
                };
            }
        }
    }
}

/// Like [`retry`], but tells the user a retry is happening.
///
/// Sends one "retrying" notice when the first retry starts, to avoid spam.
/// Final success/failure reporting stays with the caller, which has the
/// full context for the outcome message.
pub async fn retry_with_notification<F, Fut, T, E>(
    bot: &Bot,
    chat_id: ChatId,
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Debug,
{
    let start = std::time::Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => {
                return RetryResult {
                    result: Ok(value),
                    attempts,
                    total_duration: start.elapsed(),
                };
            }
            Err(e) if attempts < config.max_attempts && e.is_retryable() => {
                let delay = e.retry_after().unwrap_or_else(|| config.delay_after_attempt(attempts));
                log::warn!(
                    "Attempt {}/{} for {} failed (retrying in {:?}): {:?}",
                    attempts,
                    config.max_attempts,
                    operation_name,
                    delay,
                    e
                );

                if attempts == 1 && config.notify_user {
                    let _ = bot
                        .send_message(
                            chat_id,
                            format!(
                                "⚠️ {} failed, retrying... (attempt {}/{})",
                                operation_name,
                                attempts + 1,
                                config.max_attempts
                            ),
                        )
                        .await;
                }

                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return RetryResult {
                    result: Err(RetryError::Exhausted {
                        attempts,
                        last_error: e,
                    }),
                    attempts,
                    total_duration: start.elapsed(),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError(bool); // bool = is_retryable

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "TestError(retryable={})", self.0)
        }
    }

    impl std::error::Error for TestError {}

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.0
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_try() {
        let config = RetryConfig::quick();
        let result = retry(&config, || async { Ok::<_, TestError>(42) }).await;

        assert!(result.is_ok());
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let config = RetryConfig::quick();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry(&config, || {
            let counter = counter_clone.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 { Err(TestError(true)) } else { Ok(42) }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted_performs_exactly_max_attempts() {
        let config = RetryConfig::quick().max_attempts(3);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry(&config, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError(true))
            }
        })
        .await;

        assert!(result.is_exhausted());
        assert_eq!(result.attempts, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_error_stops_immediately() {
        let config = RetryConfig::quick();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry(&config, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError(false))
            }
        })
        .await;

        assert!(result.is_exhausted());
        assert_eq!(result.attempts, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_error_is_preserved() {
        let config = RetryConfig::quick().max_attempts(2);
        let result = retry(&config, || async { Err::<i32, _>(TestError(true)) }).await;

        match result.result {
            Err(RetryError::Exhausted { attempts, last_error }) => {
                assert_eq!(attempts, 2);
                assert!(last_error.0);
            }
            Ok(_) => panic!("expected exhaustion"),
        }
    }

    #[test]
    fn test_linear_delay_calculation() {
        let config = RetryConfig::new()
            .initial_delay(Duration::from_secs(2))
            .delay_step(Duration::from_secs(3))
            .max_delay(Duration::from_secs(9));

        assert_eq!(config.delay_after_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_after_attempt(2), Duration::from_secs(5));
        assert_eq!(config.delay_after_attempt(3), Duration::from_secs(8));
        assert_eq!(config.delay_after_attempt(4), Duration::from_secs(9)); // capped
    }

    #[test]
    fn test_fixed_delay_with_zero_step() {
        let config = RetryConfig::new()
            .initial_delay(Duration::from_secs(5))
            .delay_step(Duration::ZERO)
            .max_delay(Duration::from_secs(60));

        assert_eq!(config.delay_after_attempt(1), Duration::from_secs(5));
        assert_eq!(config.delay_after_attempt(4), Duration::from_secs(5));
    }
}
