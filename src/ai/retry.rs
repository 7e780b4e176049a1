//! Bounded retry with exponential backoff for AI calls

use std::future::Future;
use std::time::Duration;

use super::errors::AiResult;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Factor applied to the delay after every retry
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry);
        self.initial_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retries are used up. The last error is returned.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> AiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AiResult<T>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || retry >= self.max_retries => return Err(e),
                Err(e) => {
                    let delay = self.delay_for(retry);
                    log::debug!(
                        "AI call failed ({}), retry {}/{} in {:?}",
                        e,
                        retry + 1,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::errors::AiError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            multiplier: 2,
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = quick(3)
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AiError::RateLimited)
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AiResult<()> = quick(3)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AiError::EmptyResponse)
            })
            .await;

        assert!(matches!(result, Err(AiError::EmptyResponse)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_invalid_key_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AiResult<()> = quick(3)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AiError::InvalidApiKey)
            })
            .await;

        assert!(matches!(result, Err(AiError::InvalidApiKey)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_makes_one_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let _: AiResult<()> = RetryPolicy::none()
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AiError::RateLimited)
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
