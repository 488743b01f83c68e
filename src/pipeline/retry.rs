use std::{future::Future, time::Duration};

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::{
    config::PipelineConfig,
    error::{Error, Result},
};

/// Server-directed waits longer than this are still honoured, but reported.
pub const LONG_WAIT_WARNING: Duration = Duration::from_secs(120);

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included
    pub max_attempts: u32,
    /// Delay before the first backoff-scheduled retry
    pub base_delay: Duration,
    /// Cap for the exponential schedule, jitter excluded
    pub max_delay: Duration,
    /// Random extra wait as a fraction of the scheduled delay
    pub jitter_ratio: f64,
}

impl From<&PipelineConfig> for RetryPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_backoff(),
            max_delay: config.max_backoff(),
            jitter_ratio: config.jitter_ratio,
        }
    }
}

impl RetryPolicy {
    /// Delay before the `step`-th backoff-scheduled retry (0-based), without jitter.
    pub fn backoff_delay(&self, step: u32) -> Duration {
        let factor = 2_u32.saturating_pow(step);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn with_jitter(&self, delay: Duration) -> Duration {
        if self.jitter_ratio <= 0.0 || delay.is_zero() {
            return delay;
        }
        let extra = rand::rng().random_range(0.0..=self.jitter_ratio);
        delay.mul_f64(1.0 + extra)
    }
}

/// Runs remote calls with bounded retries.
///
/// Transient failures back off exponentially (`base * 2^k`, capped, plus
/// jitter). A rate-limit response carrying a wait duration sleeps exactly
/// that long and leaves `k` untouched, but still uses up an attempt; one
/// without a duration falls back to the exponential schedule. Any other
/// error is returned as is. Once `max_attempts` attempts have failed the
/// last error is wrapped in [`Error::RetryExhausted`].
///
/// Cancellation is observed before every attempt, while a call is in
/// flight and during every sleep.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0;
        let mut backoff_step = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            attempts += 1;
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = operation() => outcome,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempts > 1 {
                        log::debug!("{operation_name} succeeded on attempt {attempts}");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            if attempts >= self.policy.max_attempts {
                log::warn!(
                    "{} failed {} times, giving up: {}",
                    operation_name,
                    attempts,
                    err
                );
                return Err(Error::RetryExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }

            let delay = match &err {
                Error::RateLimited {
                    retry_after: Some(wait),
                } => {
                    if *wait > LONG_WAIT_WARNING {
                        log::warn!(
                            "{} asked to wait an unusually long {} s",
                            operation_name,
                            wait.as_secs()
                        );
                    }
                    *wait
                }
                _ => {
                    let delay = self
                        .policy
                        .with_jitter(self.policy.backoff_delay(backoff_step));
                    backoff_step += 1;
                    delay
                }
            };

            log::info!(
                "{} failed ({}). Waiting {} ms before attempt {} of {}",
                operation_name,
                err,
                delay.as_millis(),
                attempts + 1,
                self.policy.max_attempts
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1_000),
            jitter_ratio: 0.0,
        }
    }

    #[test]
    fn test_backoff_delay_doubles_and_caps() {
        let policy = policy(10);
        let delays: Vec<u128> = (0..6).map(|s| policy.backoff_delay(s).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1_000, 1_000]);
        assert_eq!(policy.backoff_delay(u32::MAX), Duration::from_millis(1_000));
    }

    #[test]
    fn test_jitter_stays_within_ratio() {
        let policy = RetryPolicy {
            jitter_ratio: 0.5,
            ..policy(3)
        };
        for _ in 0..100 {
            let delay = policy.with_jitter(Duration::from_millis(200));
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[tokio::test]
    async fn test_successful_operation() {
        let executor = RetryExecutor::new(policy(3));
        let cancel = CancellationToken::new();

        let result = executor
            .run(&cancel, "test", || async { Ok::<i32, Error>(42) })
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors_with_backoff() {
        let executor = RetryExecutor::new(policy(5));
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result = executor
            .run(&cancel, "test", || {
                let count = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count < 2 {
                        Err(Error::transient(Some(503), "unavailable"))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(310));
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_immediately() {
        let executor = RetryExecutor::new(policy(5));
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result: Result<()> = executor
            .run(&cancel, "test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::non_retryable(Some(404), "not found")) }
            })
            .await;

        assert!(matches!(
            result,
            Err(Error::NonRetryable {
                status: Some(404),
                ..
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_wait_does_not_advance_backoff() {
        let executor = RetryExecutor::new(policy(5));
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = executor
            .run(&cancel, "test", || {
                let count = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    match count {
                        0 => Err(Error::transient(None, "connection reset")),
                        1 => Err(Error::RateLimited {
                            retry_after: Some(Duration::from_secs(1)),
                        }),
                        2 => Err(Error::transient(Some(502), "bad gateway")),
                        _ => Ok("done"),
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        // 100 ms backoff, 1 s server wait, then 200 ms (second backoff step)
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1_300) && elapsed < Duration::from_millis(1_310));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_without_wait_uses_backoff() {
        let executor = RetryExecutor::new(policy(2));
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = executor
            .run(&cancel, "test", || {
                let count = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count == 0 {
                        Err(Error::RateLimited { retry_after: None })
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_attempts_exceeded() {
        let executor = RetryExecutor::new(policy(1));
        let cancel = CancellationToken::new();

        let result: Result<()> = executor
            .run(&cancel, "test", || async {
                Err(Error::RateLimited {
                    retry_after: Some(Duration::from_secs(1)),
                })
            })
            .await;

        match result {
            Err(Error::RetryExhausted { attempts, last }) => {
                assert_eq!(attempts, 1);
                assert!(matches!(*last, Error::RateLimited { .. }));
            }
            other => panic!("Expected retry exhaustion, got: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let executor = RetryExecutor::new(RetryPolicy {
            base_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
            ..policy(5)
        });
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result: Result<()> = executor
            .run(&cancel, "test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::transient(Some(500), "boom")) }
            })
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}
