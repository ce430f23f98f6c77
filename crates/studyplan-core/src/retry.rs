//! Bounded retry with fixed-base exponential backoff.
//!
//! The delay before retry `i` (counting from 0) is `base_delay ^ i` seconds,
//! so the default 2 s base waits 1 s, 2 s, 4 s, ... After the final attempt
//! the original error is returned unchanged.
//!
//! When the retried operation produces a stream, only the future that
//! creates the stream is retried. Items pulled from the stream afterwards
//! are outside the retry boundary.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that tries exactly once.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Number of attempts this policy will make.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay slept after the failed attempt with the given zero-based index.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64().powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Run `op` until it succeeds or the attempts are used up, sleeping on
    /// the tokio timer between attempts.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_with_sleep(op, tokio::time::sleep).await
    }

    /// Like [`RetryPolicy::run`], with a caller-supplied sleep function.
    pub async fn run_with_sleep<T, E, F, Fut, S, SFut>(&self, mut op: F, mut sleep: S) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        S: FnMut(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let attempts = self.attempts();
        let mut attempt_index = 0u32;

        loop {
            match op().await {
                Ok(value) => {
                    if attempt_index > 0 {
                        debug!(attempt = attempt_index + 1, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if attempt_index + 1 >= attempts {
                        debug!(attempts, "retries exhausted");
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt_index);
                    warn!(
                        attempt = attempt_index + 1,
                        max_attempts = attempts,
                        delay_ms = millis_saturating(delay),
                        error = %err,
                        "operation failed, retrying"
                    );
                    sleep(delay).await;
                    attempt_index += 1;
                }
            }
        }
    }
}

/// Whole milliseconds in `delay`, capped at `u64::MAX`.
fn millis_saturating(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    /// Drive `policy` over an operation that fails `failures` times before
    /// succeeding. Returns (result, calls made, delays slept).
    async fn drive(policy: RetryPolicy, failures: u32) -> (Result<u32, String>, u32, Vec<Duration>) {
        let calls = Cell::new(0u32);
        let delays = RefCell::new(Vec::new());

        let result = policy
            .run_with_sleep(
                || {
                    calls.set(calls.get() + 1);
                    let n = calls.get();
                    async move {
                        if n <= failures {
                            Err(format!("failure #{n}"))
                        } else {
                            Ok(n)
                        }
                    }
                },
                |d| {
                    delays.borrow_mut().push(d);
                    std::future::ready(())
                },
            )
            .await;

        (result, calls.get(), delays.into_inner())
    }

    #[test]
    fn delays_are_powers_of_the_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn huge_exponent_saturates_instead_of_panicking() {
        let policy = RetryPolicy::new(3, Duration::from_secs(10));
        assert_eq!(policy.delay_for(10_000), Duration::MAX);
    }

    #[test]
    fn saturated_delay_logs_as_max_millis() {
        assert_eq!(millis_saturating(Duration::MAX), u64::MAX);
        assert_eq!(millis_saturating(Duration::from_secs(2)), 2_000);
    }

    #[tokio::test]
    async fn first_success_does_not_sleep() {
        let (result, calls, delays) = drive(RetryPolicy::default(), 0).await;
        assert_eq!(result, Ok(1));
        assert_eq!(calls, 1);
        assert!(delays.is_empty());
    }

    #[tokio::test]
    async fn succeeds_after_k_failures_with_k_sleeps() {
        let policy = RetryPolicy::new(5, Duration::from_secs(3));
        let (result, calls, delays) = drive(policy, 3).await;
        assert_eq!(result, Ok(4));
        assert_eq!(calls, 4);
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(9),
            ]
        );
    }

    #[tokio::test]
    async fn always_failing_stops_at_max_retries_with_original_error() {
        let (result, calls, delays) = drive(RetryPolicy::default(), u32::MAX).await;
        assert_eq!(result, Err("failure #3".to_string()));
        assert_eq!(calls, 3);
        // No sleep after the final attempt.
        assert_eq!(delays.len(), 2);
    }

    #[tokio::test]
    async fn zero_max_retries_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::from_secs(2));
        let (result, calls, delays) = drive(policy, u32::MAX).await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert!(delays.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_uses_tokio_timer() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let started = tokio::time::Instant::now();
        let calls = Cell::new(0u32);
        let result: Result<&str, String> = policy
            .run(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n == 1 { Err("transient".to_string()) } else { Ok("done") } }
            })
            .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 2);
        // 0.001^0 is a full second, on the paused clock.
        assert!(started.elapsed() >= Duration::from_secs(1));
    }
}
