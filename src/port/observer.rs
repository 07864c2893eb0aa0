//! Snapshot observer port.

use crate::domain::Snapshot;

/// Receives the snapshot produced by each reconciliation pass.
///
/// # Implementation Notes
///
/// - Called synchronously from inside the pass, so `on_update` must return
///   quickly and never block on I/O
/// - Implementations must be thread-safe (`Send + Sync`)
pub trait SnapshotObserver: Send + Sync {
    fn on_update(&self, snapshot: &Snapshot);
}
