//! Bounded retries with jittered exponential backoff.
//!
//! Publishing is the only caller: a throttled or dropped upload should not
//! lose a poster that was otherwise rendered in full.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included. Never less than 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each following one.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Wait a random time between half and all of the computed delay, so
    /// concurrent uploads do not retry in lockstep.
    pub jitter: bool,
    /// Label for log lines.
    pub label: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            jitter: true,
            label: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Upper bound of the wait before retry number `retry` (1-based).
    fn ceiling(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let ceiling = self.ceiling(retry);
        if !self.jitter || ceiling.is_zero() {
            return ceiling;
        }
        let half = ceiling / 2;
        half + ceiling.mul_f64(rng.random_range(0.0..=0.5))
    }
}

/// The last error of an operation that never succeeded.
#[derive(Debug, Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct RetryExhausted<E> {
    pub error: E,
    pub attempts: u32,
}

/// Run `operation`, retrying every error.
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, RetryExhausted<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_when(config, operation, |_| true).await
}

/// Run `operation`, retrying only errors for which `retryable` holds.
/// Any other error ends the loop at once.
pub async fn retry_when<F, Fut, T, E, P>(
    config: &RetryConfig,
    operation: F,
    retryable: P,
) -> Result<T, RetryExhausted<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        if attempts >= max_attempts || !retryable(&error) {
            return Err(RetryExhausted { error, attempts });
        }

        // ThreadRng is not Send; keep it out of the await below.
        let delay = config.delay(attempts, &mut rand::rng());
        debug!(
            label = %config.label,
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            "Retrying after error: {}",
            error
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig::new("test").with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let config = RetryConfig::new("test")
            .with_base_delay(Duration::from_millis(100))
            .without_jitter();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(config.delay(1, &mut rng), Duration::from_millis(100));
        assert_eq!(config.delay(2, &mut rng), Duration::from_millis(200));
        assert_eq!(config.delay(3, &mut rng), Duration::from_millis(400));
        assert_eq!(config.delay(12, &mut rng), Duration::from_secs(4));
    }

    #[test]
    fn test_jitter_stays_within_half_and_full_delay() {
        let config = RetryConfig::new("test").with_base_delay(Duration::from_millis(400));
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let delay = config.delay(2, &mut rng);
            assert!(delay >= Duration::from_millis(400) && delay <= Duration::from_millis(800));
        }
    }

    #[tokio::test]
    async fn test_recovers_from_transient_errors() {
        let calls = AtomicU32::new(0);
        let value = retry_async(&fast(), || async {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err("throttled"),
                n => Ok(n),
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_at_max_attempts() {
        let calls = AtomicU32::new(0);
        let err = retry_async(&fast().with_max_attempts(2), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("down")
        })
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(err.to_string(), "down (after 2 attempt(s))");
    }

    #[tokio::test]
    async fn test_final_errors_end_immediately() {
        let calls = AtomicU32::new(0);
        let err = retry_when(
            &fast(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("forbidden")
            },
            |e| *e != "forbidden",
        )
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(fast().with_max_attempts(0).max_attempts, 1);
    }
}
