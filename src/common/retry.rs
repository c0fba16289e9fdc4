// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Outcome of a single bounded attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError<E> {
    TimedOut(Duration),
    Failed(E),
}

impl<E: Display> Display for AttemptError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::TimedOut(d) => write!(f, "timed out after {}ms", d.as_millis()),
            AttemptError::Failed(e) => write!(f, "{e}"),
        }
    }
}

/// Run `fut`, giving up after `limit` so one dead endpoint cannot stall a fallback chain.
pub async fn with_timeout<Fut, T, E>(limit: Duration, fut: Fut) -> Result<T, AttemptError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match timeout(limit, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(AttemptError::Failed(e)),
        Err(_) => Err(AttemptError::TimedOut(limit)),
    }
}

/// Retry an async operation with exponential backoff; each attempt is bounded by `per_attempt`.
pub async fn retry_async<F, Fut, T, E>(
    mut op: F,
    attempts: usize,
    initial_delay: Duration,
    per_attempt: Duration,
) -> Result<T, AttemptError<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match with_timeout(per_attempt, op(attempt)).await {
            Ok(v) => return Ok(v),
            Err(_) if attempt < attempts => {
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
        let res: Result<u32, AttemptError<()>> = retry_async(
            |_| {
                let current = counter.fetch_add(1, Ordering::Relaxed);
                async move { if current < 2 { Err(()) } else { Ok(7) } }
            },
            4,
            Duration::from_millis(1),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(res, Ok(7));
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn slow_attempt_times_out() {
        let res: Result<(), AttemptError<()>> = with_timeout(Duration::from_millis(10), async {
            sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(res, Err(AttemptError::TimedOut(Duration::from_millis(10))));
    }

    #[tokio::test]
    async fn last_error_is_returned_after_exhaustion() {
        let res: Result<(), AttemptError<&str>> = retry_async(
            |n| async move { if n == 2 { Err("second") } else { Err("other") } },
            2,
            Duration::from_millis(1),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(res, Err(AttemptError::Failed("second")));
    }
}
