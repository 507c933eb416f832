use std::future::Future;
use std::time::Duration;

use switchboard_core::config::SlackConfig;
use tokio::time::sleep;
use tracing::warn;

use crate::error::Result;

/// Upper bound on a single backoff delay.
const BACKOFF_MAX_MS: u64 = 10_000;
/// Jitter fraction applied to each delay (+0..10 %).
const JITTER_FRACTION: f64 = 0.10;

/// Bounded exponential backoff for idempotent outbound calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SlackConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Delay before attempt `attempt + 1`. A server-provided `Retry-After`
    /// wins over the computed delay.
    ///
    /// Schedule: base → 2·base → 4·base → … capped at 10 s.
    pub fn delay(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        if let Some(secs) = retry_after_secs {
            return Duration::from_secs(secs);
        }
        let base_ms = self.base_delay.as_millis() as u64;
        let exp = base_ms
            .saturating_mul(1u64 << attempt.saturating_sub(1).min(16))
            .min(BACKOFF_MAX_MS);
        Duration::from_millis(exp + jitter_ms(exp))
    }

    /// Run `call` until it succeeds, fails permanently, or the attempt budget
    /// is spent.
    pub async fn run<T, F, Fut>(&self, method: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && e.is_transient() => {
                    let delay = self.delay(attempt, e.retry_after_secs());
                    warn!(
                        method,
                        attempt,
                        max = self.max_attempts,
                        error = %e,
                        retry_after_ms = delay.as_millis() as u64,
                        "outbound call failed, retrying with backoff"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Jitter offset (0 … `JITTER_FRACTION * base_ms`) derived from the clock's
/// sub-second nanos.
fn jitter_ms(base_ms: u64) -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let max_jitter = ((base_ms as f64) * JITTER_FRACTION) as u64;
    if max_jitter == 0 {
        return 0;
    }
    (nanos as u64) % max_jitter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChannelError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn delay_grows_and_caps() {
        let p = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(1000),
        };
        assert!(p.delay(1, None) >= Duration::from_millis(1000));
        assert!(p.delay(2, None) >= Duration::from_millis(2000));
        assert!(p.delay(9, None) <= Duration::from_millis(11_000));
        assert_eq!(p.delay(1, Some(3)), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = &AtomicU32::new(0);
        let result = policy(3)
            .run("chat.postMessage", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ChannelError::Timeout {
                        method: "chat.postMessage".into(),
                        ms: 5,
                    })
                } else {
                    Ok("1.1")
                }
            })
            .await;
        assert_eq!(result.expect("second attempt"), "1.1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let calls = &AtomicU32::new(0);
        let result: Result<()> = policy(3)
            .run("chat.postMessage", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ChannelError::Http {
                    method: "chat.postMessage".into(),
                    status: 502,
                    body: String::new(),
                })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<()> = policy(5)
            .run("chat.update", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ChannelError::ConfigError("no address".into()))
            })
            .await;
        assert!(matches!(result, Err(ChannelError::ConfigError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
