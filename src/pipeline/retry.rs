use std::fmt::Display;
use std::thread::sleep;
use std::time::Duration;

/// Run `op` up to `attempts` times, doubling `delay` between failures.
///
/// Returns the last error when every attempt fails.
pub(crate) fn retry_with_backoff<T, E, F>(attempts: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Result<T, E>,
{
    let attempts = attempts.max(1);
    let mut delay = delay;
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                tracing::warn!("Attempt {attempt}/{attempts} failed, retrying: {err}");
                if !delay.is_zero() {
                    sleep(delay);
                }
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::retry_with_backoff;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn retries_until_success() {
        let attempts = AtomicUsize::new(0);
        let result: Result<usize, String> = retry_with_backoff(5, Duration::ZERO, || {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            if attempt < 3 {
                Err("fail".to_string())
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result, Ok(3));
        assert_eq!(attempts.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn stops_after_attempts() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), String> = retry_with_backoff(4, Duration::ZERO, || {
            attempts.fetch_add(1, Ordering::Relaxed);
            Err("fail".to_string())
        });
        assert_eq!(result, Err("fail".to_string()));
        assert_eq!(attempts.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let attempts = AtomicUsize::new(0);
        let _: Result<(), String> = retry_with_backoff(0, Duration::ZERO, || {
            attempts.fetch_add(1, Ordering::Relaxed);
            Err("fail".into())
        });
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }
}
