//! Optional retry with exponential backoff.
//!
//! Only transient failures are retried (see [`BackendError::is_transient`]).
//! The default configuration performs no retries, so a failing backend call
//! fails the request on the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::BackendError;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (0 = fail immediately).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Scale each delay by a fixed per-attempt factor.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        if self.jitter {
            let factor = match attempt % 4 {
                0 => 0.75,
                1 => 0.90,
                2 => 0.60,
                _ => 0.85,
            };
            Duration::from_secs_f64(capped * factor)
        } else {
            Duration::from_secs_f64(capped)
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    service: &str,
    mut op: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "{service} call failed ({e}); retry {}/{} in {:.2}s",
                    attempt + 1,
                    config.max_retries,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast(retries: u32) -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryConfig::with_retries(retries)
        }
    }

    #[test]
    fn default_config_no_retries() {
        assert_eq!(RetryConfig::default().max_retries, 0);
    }

    #[test]
    fn delay_increases_and_is_capped() {
        let config = RetryConfig {
            jitter: false,
            max_delay: Duration::from_secs(2),
            ..RetryConfig::with_retries(10)
        };
        assert!(config.delay_for_attempt(1) > config.delay_for_attempt(0));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(2));
    }

    #[test]
    fn jitter_reduces_delay() {
        let jittered = RetryConfig::with_retries(3);
        let plain = RetryConfig {
            jitter: false,
            ..RetryConfig::with_retries(3)
        };
        assert!(jittered.delay_for_attempt(2) <= plain.delay_for_attempt(2));
    }

    #[tokio::test]
    async fn default_config_calls_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&RetryConfig::default(), "chat", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(BackendError::Request("connection reset".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(3), "chat", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(BackendError::Status {
                        service: "chat",
                        status: 503,
                        body: String::new(),
                    })
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(5), "chat", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(BackendError::Status {
                    service: "chat",
                    status: 401,
                    body: "unauthorized".into(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
