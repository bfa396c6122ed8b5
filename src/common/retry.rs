// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry an async operation with exponential backoff.
///
/// `op` receives the 1-based attempt number. Errors rejected by `retryable`
/// return immediately; otherwise the last error is returned once `attempts`
/// is exhausted.
pub async fn retry_async<F, Fut, T, E, R>(
    mut op: F,
    attempts: usize,
    initial_delay: Duration,
    retryable: R,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    R: Fn(&E) -> bool,
{
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < attempts && retryable(&e) => {
                tracing::debug!(attempt, error = %e, "retrying after {:?}", delay);
                sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, String> = retry_async(
            |_| {
                let current = counter.fetch_add(1, Ordering::Relaxed);
                async move {
                    if current < 2 {
                        Err("not yet".to_string())
                    } else {
                        Ok(7)
                    }
                }
            },
            4,
            Duration::from_millis(1),
            |_| true,
        )
        .await;

        assert_eq!(res.unwrap(), 7);
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempts() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, String> = retry_async(
            |attempt| {
                counter.fetch_add(1, Ordering::Relaxed);
                async move { Err(format!("attempt {attempt} failed")) }
            },
            3,
            Duration::from_millis(1),
            |_| true,
        )
        .await;

        assert_eq!(res.unwrap_err(), "attempt 3 failed");
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, String> = retry_async(
            |attempt| {
                counter.fetch_add(1, Ordering::Relaxed);
                async move { Err(format!("fatal on attempt {attempt}")) }
            },
            5,
            Duration::from_millis(1),
            |e: &String| !e.starts_with("fatal"),
        )
        .await;

        assert_eq!(res.unwrap_err(), "fatal on attempt 1");
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}
