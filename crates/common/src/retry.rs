use std::time::Duration;

/// Retry a function with exponential backoff.
///
/// # Arguments
/// * `f` - The function to retry
/// * `max_attempts` - Total number of attempts, clamped to at least one
/// * `base_delay_ms` - Initial delay in milliseconds (doubles each retry)
/// * `operation_name` - Human-readable name for logging
pub fn retry_with_backoff<F, T, E>(
    mut f: F,
    max_attempts: u32,
    base_delay_ms: u64,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match f() {
            Ok(result) => return Ok(result),
            Err(e) if attempt + 1 < max_attempts => {
                let delay_ms = base_delay_ms.saturating_mul(2_u64.saturating_pow(attempt));
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}ms...",
                    operation_name,
                    attempt + 1,
                    max_attempts,
                    e,
                    delay_ms
                );
                std::thread::sleep(Duration::from_millis(delay_ms));
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    "{} failed after {} attempts: {}",
                    operation_name,
                    max_attempts,
                    e
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_succeeds_after_transient_failures() {
        let mut calls = 0;
        let result: Result<u32, String> = retry_with_backoff(
            || {
                calls += 1;
                if calls < 3 { Err(format!("busy #{calls}")) } else { Ok(calls) }
            },
            5,
            0,
            "device open",
        );

        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3, "Should stop retrying once the call succeeds");
    }

    #[test]
    fn test_retry_gives_up_with_last_error() {
        let mut calls = 0;
        let result: Result<(), String> = retry_with_backoff(
            || {
                calls += 1;
                Err(format!("attempt {calls}"))
            },
            3,
            0,
            "device open",
        );

        assert_eq!(result, Err("attempt 3".to_string()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_zero_attempts_still_calls_once() {
        let mut calls = 0;
        let _: Result<(), &str> = retry_with_backoff(
            || {
                calls += 1;
                Err("nope")
            },
            0,
            0,
            "device open",
        );
        assert_eq!(calls, 1);
    }
}
