//! Guardian lifecycle: subscriptions, the worker task and snapshot access.
//!
//! All adapter events for one engine are funneled into a single unbounded
//! queue. One worker task drains it, interleaved with safety-net ticks, so
//! no two passes for the same engine ever overlap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::emitter::SnapshotEmitter;
use super::reconcile::{PassReport, PassTrigger, Reconciler};
use super::settings::GuardianSettings;
use crate::domain::{Snapshot, SubscriptionId};
use crate::error::{Error, Result};
use crate::port::{AdapterEvent, EventKind, EventSink, ExchangeAdapter, SnapshotObserver};

/// Handles owned while the worker runs.
struct Running {
    subscriptions: Vec<SubscriptionId>,
    shutdown_tx: watch::Sender<bool>,
    worker: JoinHandle<()>,
}

pub struct GuardianEngine {
    symbol: String,
    safety_net_interval: Duration,
    resync_ticks: u32,
    adapter: Arc<dyn ExchangeAdapter>,
    reconciler: Arc<Mutex<Reconciler>>,
    emitter: Arc<SnapshotEmitter>,
    lifecycle: Mutex<Option<Running>>,
    running: AtomicBool,
}

impl GuardianEngine {
    /// Build an engine. Invalid settings are rejected here and the engine
    /// never starts.
    pub fn new(settings: GuardianSettings, adapter: Arc<dyn ExchangeAdapter>) -> Result<Self> {
        settings.validate()?;
        let emitter = SnapshotEmitter::new(Snapshot::empty(settings.symbol.clone()));
        Ok(Self {
            symbol: settings.symbol.clone(),
            safety_net_interval: settings.safety_net_interval,
            resync_ticks: settings.open_order_resync_ticks,
            adapter: Arc::clone(&adapter),
            reconciler: Arc::new(Mutex::new(Reconciler::new(settings, adapter))),
            emitter: Arc::new(emitter),
            lifecycle: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// Subscribe to the adapter's streams and start the worker. Calling
    /// `start` on a running engine does nothing.
    pub async fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.is_some() {
            debug!(symbol = %self.symbol, "Guardian already running");
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscriptions = Vec::with_capacity(EventKind::ALL.len());
        for kind in EventKind::ALL {
            match self.adapter.subscribe(kind, EventSink::new(tx.clone())).await {
                Ok(id) => subscriptions.push(id),
                Err(err) => {
                    self.unsubscribe_all(subscriptions).await;
                    return Err(Error::Startup(format!(
                        "subscribing to {} events failed: {err}",
                        kind.as_str()
                    )));
                }
            }
        }
        drop(tx);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = tokio::spawn(run_worker(
            Arc::clone(&self.reconciler),
            Arc::clone(&self.emitter),
            rx,
            shutdown_rx,
            self.safety_net_interval,
            self.resync_ticks,
        ));

        *lifecycle = Some(Running {
            subscriptions,
            shutdown_tx,
            worker,
        });
        self.running.store(true, Ordering::SeqCst);
        info!(
            symbol = %self.symbol,
            exchange = self.adapter.exchange_name(),
            interval_ms = self.safety_net_interval.as_millis() as u64,
            "Guardian engine started"
        );
        Ok(())
    }

    /// Unsubscribe, disarm the timer and wait for an in-flight pass to
    /// finish. Safe to call repeatedly and before `start`.
    pub async fn stop(&self) {
        let Some(running) = self.lifecycle.lock().await.take() else {
            return;
        };
        self.running.store(false, Ordering::SeqCst);

        self.unsubscribe_all(running.subscriptions).await;
        // The worker may already have exited, which drops the receiver.
        let _ = running.shutdown_tx.send(true);
        if let Err(err) = running.worker.await {
            warn!(error = %err, "Guardian worker ended abnormally");
        }
        info!(symbol = %self.symbol, "Guardian engine stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Latest snapshot. Safe to call while a pass is running.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.emitter.current()
    }

    /// Async stream of snapshots, one per pass.
    #[must_use]
    pub fn updates(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.emitter.subscribe()
    }

    pub fn register_observer(&self, observer: Box<dyn SnapshotObserver>) {
        self.emitter.register(observer);
    }

    /// Run a safety-net pass immediately, serialized with the worker.
    pub async fn reconcile_now(&self) -> PassReport {
        execute_pass(&self.reconciler, &self.emitter, PassTrigger::SafetyNet).await
    }

    async fn unsubscribe_all(&self, subscriptions: Vec<SubscriptionId>) {
        for id in subscriptions {
            if let Err(err) = self.adapter.unsubscribe(id).await {
                warn!(subscription = %id, error = %err, "Unsubscribe failed");
            }
        }
    }
}

impl Drop for GuardianEngine {
    fn drop(&mut self) {
        if let Some(running) = self.lifecycle.get_mut().take() {
            let _ = running.shutdown_tx.send(true);
        }
    }
}

async fn run_worker(
    reconciler: Arc<Mutex<Reconciler>>,
    emitter: Arc<SnapshotEmitter>,
    mut events: mpsc::UnboundedReceiver<AdapterEvent>,
    mut shutdown: watch::Receiver<bool>,
    interval: Duration,
    resync_ticks: u32,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks: u64 = 0;
    let mut events_open = true;

    execute_pass(&reconciler, &emitter, PassTrigger::Startup).await;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => {
                debug!("Guardian worker shutting down");
                break;
            }

            event = events.recv(), if events_open => {
                match event {
                    Some(event) => {
                        execute_pass(&reconciler, &emitter, PassTrigger::Event(event)).await;
                    }
                    None => {
                        warn!("Adapter event queue closed; continuing on safety-net ticks");
                        events_open = false;
                    }
                }
            }

            _ = ticker.tick() => {
                ticks += 1;
                let trigger = if resync_ticks > 0 && ticks % u64::from(resync_ticks) == 0 {
                    PassTrigger::Resync
                } else {
                    PassTrigger::SafetyNet
                };
                execute_pass(&reconciler, &emitter, trigger).await;
            }
        }
    }
}

async fn execute_pass(
    reconciler: &Mutex<Reconciler>,
    emitter: &SnapshotEmitter,
    trigger: PassTrigger,
) -> PassReport {
    let mut reconciler = reconciler.lock().await;
    let trigger_label = trigger.label();
    let report = reconciler.run_pass(trigger).await;
    emitter.publish(reconciler.snapshot());
    trace!(
        version = report.version,
        trigger = trigger_label,
        calls = report.adapter_calls,
        entries = report.log_entries,
        status = %report.status,
        "Pass complete"
    );
    report
}
