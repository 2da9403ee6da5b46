//! Retry with exponential backoff for fetch operations

use std::time::Duration;

/// Backoff ceiling — no single wait exceeds this
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential backoff: 2^attempt seconds (2s, 4s, 8s, ...), capped at 60s
pub fn backoff_duration(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt)).min(MAX_BACKOFF)
}

/// Retry a fallible operation with exponential backoff.
///
/// `is_retryable` decides whether an error is worth another attempt.
/// On retryable errors, logs the failure, sleeps, and retries up to
/// `max_retries` additional attempts.
///
/// Returns `Ok(T)` on first success, or the final `Err` on exhaustion /
/// non-retryable error.
pub fn retry_with_backoff<T, E: std::fmt::Display>(
    label: &str,
    max_retries: u32,
    is_retryable: impl Fn(&E) -> bool,
    mut attempt_fn: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                attempt += 1;
                log::debug!("{label}: attempt {attempt}/{max_retries} failed: {e}, retrying...");
                std::thread::sleep(backoff_duration(attempt));
            }
            Err(e) => {
                log::error!("{label}: failed permanently: {e}");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_exponential() {
        assert_eq!(backoff_duration(1), Duration::from_secs(2));
        assert_eq!(backoff_duration(2), Duration::from_secs(4));
        assert_eq!(backoff_duration(3), Duration::from_secs(8));
    }

    #[test]
    fn backoff_capped() {
        assert_eq!(backoff_duration(10), Duration::from_secs(60));
        assert_eq!(backoff_duration(63), Duration::from_secs(60));
    }

    #[test]
    fn succeeds_first_try() {
        let result: Result<i32, String> = retry_with_backoff("test", 3, |_| true, || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn non_retryable_fails_immediately() {
        let mut calls = 0;
        let result: Result<i32, String> = retry_with_backoff(
            "test",
            3,
            |_| false,
            || {
                calls += 1;
                Err("fatal".to_string())
            },
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_until_success() {
        let mut calls = 0;
        let result: Result<i32, String> = retry_with_backoff(
            "test",
            3,
            |_| true,
            || {
                calls += 1;
                if calls < 2 { Err("flaky".to_string()) } else { Ok(7) }
            },
        );
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 2);
    }
}
