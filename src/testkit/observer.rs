//! Snapshot observer that records what it is given.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{GuardStatus, Snapshot};
use crate::port::SnapshotObserver;

/// Keeps every snapshot it is notified with. Clones share the same buffer,
/// so a test can hand one clone to the engine and inspect the other.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    seen: Arc<Mutex<Vec<Snapshot>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.seen.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn last(&self) -> Option<Snapshot> {
        self.seen.lock().last().cloned()
    }

    /// Guard status of every recorded snapshot, oldest first.
    pub fn statuses(&self) -> Vec<GuardStatus> {
        self.seen.lock().iter().map(|s| s.guard_status).collect()
    }
}

impl SnapshotObserver for RecordingObserver {
    fn on_update(&self, snapshot: &Snapshot) {
        self.seen.lock().push(snapshot.clone());
    }
}
