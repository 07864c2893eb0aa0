//! Snapshot publication.
//!
//! After each pass the engine hands the new snapshot to a [`SnapshotEmitter`],
//! which swaps it into the shared cell read by `snapshot()`, publishes it on a
//! watch channel, and calls every registered observer before returning.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::{GuardStatus, Snapshot};
use crate::port::SnapshotObserver;

/// Registry of snapshot observers.
pub struct ObserverRegistry {
    observers: Vec<Box<dyn SnapshotObserver>>,
}

impl ObserverRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { observers: vec![] }
    }

    pub fn register(&mut self, observer: Box<dyn SnapshotObserver>) {
        self.observers.push(observer);
    }

    pub fn notify_all(&self, snapshot: &Snapshot) {
        for observer in &self.observers {
            observer.on_update(snapshot);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SnapshotEmitter {
    cell: RwLock<Arc<Snapshot>>,
    tx: watch::Sender<Arc<Snapshot>>,
    observers: RwLock<ObserverRegistry>,
}

impl SnapshotEmitter {
    #[must_use]
    pub fn new(initial: Snapshot) -> Self {
        let initial = Arc::new(initial);
        let (tx, _rx) = watch::channel(Arc::clone(&initial));
        Self {
            cell: RwLock::new(initial),
            tx,
            observers: RwLock::new(ObserverRegistry::new()),
        }
    }

    /// Latest published snapshot. Never blocks on a running pass.
    #[must_use]
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.cell.read())
    }

    /// Receiver that sees every snapshot published from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }

    pub fn register(&self, observer: Box<dyn SnapshotObserver>) {
        self.observers.write().register(observer);
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Publish a snapshot to the cell, the watch channel and all observers.
    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        *self.cell.write() = Arc::clone(&snapshot);
        // No receivers is fine; `current()` still serves the cell.
        self.tx.send_replace(Arc::clone(&snapshot));
        self.observers.read().notify_all(&snapshot);
    }
}

/// Logs guard-status changes via tracing.
#[derive(Default)]
pub struct LogObserver {
    last: RwLock<Option<GuardStatus>>,
}

impl LogObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotObserver for LogObserver {
    fn on_update(&self, snapshot: &Snapshot) {
        let mut last = self.last.write();
        if *last == Some(snapshot.guard_status) {
            return;
        }
        *last = Some(snapshot.guard_status);
        match snapshot.guard_status {
            GuardStatus::Pending => warn!(
                symbol = %snapshot.symbol,
                position = %snapshot.position.amount,
                target_stop = ?snapshot.target_stop_price,
                "Position unprotected"
            ),
            status => info!(
                symbol = %snapshot.symbol,
                status = %status,
                version = snapshot.version,
                "Guard status"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingObserver {
        count: Arc<AtomicUsize>,
    }

    impl SnapshotObserver for CountingObserver {
        fn on_update(&self, _snapshot: &Snapshot) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn publish_updates_cell_and_observers() {
        let emitter = SnapshotEmitter::new(Snapshot::empty("BTCUSDT"));
        let count = Arc::new(AtomicUsize::new(0));
        emitter.register(Box::new(CountingObserver {
            count: count.clone(),
        }));
        emitter.register(Box::new(CountingObserver {
            count: count.clone(),
        }));

        let mut next = Snapshot::empty("BTCUSDT");
        next.version = 7;
        emitter.publish(next);

        assert_eq!(emitter.current().version, 7);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(emitter.observer_count(), 2);
    }

    #[test]
    fn watch_receivers_see_latest() {
        let emitter = SnapshotEmitter::new(Snapshot::empty("BTCUSDT"));
        let rx = emitter.subscribe();

        let mut next = Snapshot::empty("BTCUSDT");
        next.version = 3;
        emitter.publish(next);

        assert_eq!(rx.borrow().version, 3);
    }

    #[test]
    fn log_observer_tolerates_repeats() {
        let observer = LogObserver::new();
        let snapshot = Snapshot::empty("BTCUSDT");
        observer.on_update(&snapshot);
        observer.on_update(&snapshot);
        assert_eq!(*observer.last.read(), Some(GuardStatus::Monitoring));
    }
}
