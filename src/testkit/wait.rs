//! Helpers for waiting on asynchronous engine output.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::domain::Snapshot;

/// Wait until a snapshot satisfying `predicate` is published, or `limit`
/// elapses. The current value is checked first.
pub async fn wait_for<F>(
    rx: &mut watch::Receiver<Arc<Snapshot>>,
    limit: Duration,
    predicate: F,
) -> Option<Arc<Snapshot>>
where
    F: Fn(&Snapshot) -> bool,
{
    let wait = async {
        loop {
            {
                let current = rx.borrow_and_update();
                if predicate(&current) {
                    return Some(Arc::clone(&current));
                }
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    };
    tokio::time::timeout(limit, wait).await.ok().flatten()
}

/// Poll `condition` every few milliseconds until it holds or `limit`
/// elapses. Returns whether it held.
pub async fn eventually<F>(limit: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
