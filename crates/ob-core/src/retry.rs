//! `withRetry(timeout, pred)` (§5, §9): short-poll a predicate every 100ms
//! up to a timeout. Used at exactly two call sites in this system: bucket-
//! init's BMD fix-up wait, and IC ownership-table lookup after a sync
//! (`original_source/ais/ic.go`). Implemented once here so both call sites
//! share it rather than re-deriving the loop.

use std::time::Duration;

/// Polls `pred` every [`ob_core::RETRY_POLL_INTERVAL_MS`](crate::RETRY_POLL_INTERVAL_MS)
/// until it returns `Some(t)` or `timeout` elapses. Returns `None` on
/// timeout. `pred` is async so it may itself consult remote state (e.g. a
/// peer IC member) between polls.
pub async fn with_retry<F, Fut, T>(timeout: Duration, mut pred: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Option<T>>,
{
    let interval = Duration::from_millis(crate::RETRY_POLL_INTERVAL_MS);
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(v) = pred().await {
            return Some(v);
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(interval.min(deadline - tokio::time::Instant::now())).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn returns_as_soon_as_predicate_succeeds() {
        let calls = AtomicUsize::new(0);
        let result = with_retry(Duration::from_millis(500), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n >= 2 {
                Some(n)
            } else {
                None
            }
        })
        .await;
        assert_eq!(result, Some(2));
    }

    #[tokio::test]
    async fn times_out_when_predicate_never_succeeds() {
        let result: Option<()> =
            with_retry(Duration::from_millis(150), || async { None }).await;
        assert_eq!(result, None);
    }
}
