//! Retry logic with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::SourceError;

/// Backoff strategy for retrying failed fetches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The delay is calculated as `base * (factor ^ attempt)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(250),
            factor: 2.0,
            max: Duration::from_secs(4),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = (base.as_secs_f64() * factor.powi(exponent)).max(0.0);
                let capped = Duration::from_secs_f64(seconds.min(max.as_secs_f64()));
                if !jitter {
                    return capped;
                }

                let millis = u64::try_from(capped.as_millis()).unwrap_or(u64::MAX);
                let spread = millis / 2;
                let offset = fastrand::u64(0..=spread * 2);
                Duration::from_millis((millis + offset).saturating_sub(spread))
            }
        }
    }
}

/// Configuration for retrying transient fetch failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Enables or disables the retry mechanism.
    pub enabled: bool,
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 2,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Whether attempt `attempt` (0-based) failing with `error` earns another try.
    pub fn should_retry(&self, error: &SourceError, attempt: u32) -> bool {
        self.enabled && error.retryable() && attempt < self.max_retries
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// exhausts the retry budget. The closure receives the 0-based attempt number.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if config.should_retry(&error, attempt) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    target: "statlens::retry",
                    %label,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_millis(100),
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(7), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(250),
            factor: 2.0,
            max: Duration::from_secs(4),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(250));
        assert_eq!(backoff.delay(1), Duration::from_millis(500));
        assert_eq!(backoff.delay(3), Duration::from_secs(2));
        assert_eq!(backoff.delay(5), Duration::from_secs(4));
    }

    #[test]
    fn test_negative_factor_clamps_to_zero_delay() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: -2.0,
            max: Duration::from_secs(4),
            jitter: true,
        };

        assert_eq!(backoff.delay(1), Duration::ZERO);
        let even = backoff.delay(2).as_millis();
        assert!((200..=600).contains(&even), "even={even}");
    }

    #[test]
    fn test_jitter_stays_within_half_of_delay() {
        let backoff = Backoff::default();
        for _ in 0..20 {
            let delay_ms = backoff.delay(1).as_millis();
            assert!((250..=750).contains(&delay_ms), "delay_ms={delay_ms}");
        }
    }

    #[test]
    fn test_default_retry_config() {
        let config = RetryConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_retries, 2);
        assert!(config.should_retry(&SourceError::unavailable("503"), 0));
        assert!(!config.should_retry(&SourceError::unavailable("503"), 2));
        assert!(!config.should_retry(&SourceError::symbol_not_found("gone"), 0));
        assert!(!RetryConfig::no_retry().should_retry(&SourceError::timeout("slow"), 0));
    }

    #[tokio::test]
    async fn test_with_retry_recovers_from_transient_failures() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::fixed(Duration::from_millis(1), 2);

        let result = with_retry(&config, "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(SourceError::unavailable("flaky"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_permanent_failure() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::fixed(Duration::from_millis(1), 5);

        let result: Result<(), SourceError> = with_retry(&config, "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SourceError::invalid_response("garbage")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
