use crate::config::RetryConfig;
use crate::error::{CoreError, CoreResult};
use rand::Rng;
use std::time::Duration;
use tracing::warn;

/// Bounded-retry policy for operations that touch persistent state. Only
/// transient errors are retried; logical errors pass through untouched on
/// the first attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::constants::DEFAULT_RETRY_ATTEMPTS,
            base_delay_ms: crate::constants::DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
        }
    }
}

impl RetryPolicy {
    /// Linear backoff with a little jitter so concurrent retriers spread
    /// out.
    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms.saturating_mul(attempt as u64);
        let jitter = rand::thread_rng().gen_range(0..=self.base_delay_ms / 2 + 1);
        Duration::from_millis(base + jitter)
    }
}

/// Run `operation`, retrying transient failures up to the policy's attempt
/// budget. After exhaustion the last error is re-raised tagged as a
/// non-retryable storage error.
pub fn with_retry<T, F>(policy: RetryPolicy, context: &str, mut operation: F) -> CoreResult<T>
where
    F: FnMut() -> CoreResult<T>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error: Option<CoreError> = None;

    for attempt in 1..=attempts {
        match operation() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                warn!(
                    "{}: attempt {}/{} failed: {}",
                    context, attempt, attempts, e
                );
                last_error = Some(e);
                if attempt < attempts {
                    std::thread::sleep(policy.delay_for(attempt));
                }
            }
            Err(e) => return Err(e),
        }
    }

    let last = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown failure".to_string());
    Err(CoreError::Storage(format!(
        "{} failed after {} attempts: {}",
        context, attempts, last
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 0,
        }
    }

    #[test]
    fn test_success_on_first_attempt() {
        let calls = Cell::new(0);
        let result = with_retry(fast_policy(), "op", || {
            calls.set(calls.get() + 1);
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retries_transient_then_succeeds() {
        let calls = Cell::new(0);
        let result = with_retry(fast_policy(), "op", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(CoreError::Io(std::io::Error::other("flaky")))
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_exhaustion_becomes_storage_error() {
        let calls = Cell::new(0);
        let result: CoreResult<()> = with_retry(fast_policy(), "write shard", || {
            calls.set(calls.get() + 1);
            Err(CoreError::Io(std::io::Error::other("disk on fire")))
        });

        assert_eq!(calls.get(), 3);
        match result {
            Err(CoreError::Storage(msg)) => {
                assert!(msg.contains("write shard"));
                assert!(msg.contains("disk on fire"));
            }
            other => panic!("expected storage error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_logical_errors_not_retried() {
        let calls = Cell::new(0);
        let result: CoreResult<()> = with_retry(fast_policy(), "op", || {
            calls.set(calls.get() + 1);
            Err(CoreError::Validation("bad input".to_string()))
        });

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_storage_errors_not_retried_further() {
        let calls = Cell::new(0);
        let result: CoreResult<()> = with_retry(fast_policy(), "op", || {
            calls.set(calls.get() + 1);
            Err(CoreError::Storage("already exhausted".to_string()))
        });

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(CoreError::Storage(_))));
    }
}
