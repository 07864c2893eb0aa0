//! Reconciliation loop.
//!
//! One [`Reconciler::run_pass`] merges the triggering event into local state,
//! works out where protection should be, and issues the cancel and place
//! calls that move the venue towards it. Adapter failures never abort a
//! pass: not-found counts as success, everything else is left for the next
//! pass to retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::settings::GuardianSettings;
use crate::domain::{
    compute_targets, GuardStateMachine, GuardStatus, OrderRecord, OrderSpec, Position,
    ProtectionTargets, ProtectiveKind, ProtectiveOrder, Snapshot, TradeLog, TradeLogEntry,
    TradeLogKind,
};
use crate::error::AdapterError;
use crate::port::{AdapterEvent, ErrorClass, ExchangeAdapter, NotFoundSignature};

const SLOTS: [ProtectiveKind; 2] = [ProtectiveKind::Stop, ProtectiveKind::Trailing];

/// What caused a pass.
#[derive(Debug, Clone)]
pub enum PassTrigger {
    /// First pass after start; seeds open orders from the venue.
    Startup,
    Event(AdapterEvent),
    /// Periodic pass covering missed events.
    SafetyNet,
    /// Safety-net pass that also requeries open orders.
    Resync,
}

impl PassTrigger {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Event(_) => "event",
            Self::SafetyNet => "safety_net",
            Self::Resync => "resync",
        }
    }
}

/// Outcome of a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub version: u64,
    pub adapter_calls: usize,
    pub log_entries: usize,
    pub status: GuardStatus,
}

/// Everything the loop remembers between passes.
#[derive(Debug)]
struct GuardState {
    seq: u64,
    position: Position,
    position_seen: bool,
    last_price: Option<Decimal>,
    stop: Option<ProtectiveOrder>,
    trailing: Option<ProtectiveOrder>,
    open_orders: Vec<OrderRecord>,
    targets: Option<ProtectionTargets>,
    machine: GuardStateMachine,
    trade_log: TradeLog,
}

impl GuardState {
    fn new(trade_log_cap: usize) -> Self {
        Self {
            seq: 0,
            position: Position::flat(),
            position_seen: false,
            last_price: None,
            stop: None,
            trailing: None,
            open_orders: Vec::new(),
            targets: None,
            machine: GuardStateMachine::new(),
            trade_log: TradeLog::new(trade_log_cap),
        }
    }

    const fn slot(&self, kind: ProtectiveKind) -> &Option<ProtectiveOrder> {
        match kind {
            ProtectiveKind::Stop => &self.stop,
            ProtectiveKind::Trailing => &self.trailing,
        }
    }

    fn slot_mut(&mut self, kind: ProtectiveKind) -> &mut Option<ProtectiveOrder> {
        match kind {
            ProtectiveKind::Stop => &mut self.stop,
            ProtectiveKind::Trailing => &mut self.trailing,
        }
    }
}

pub struct Reconciler {
    settings: GuardianSettings,
    adapter: Arc<dyn ExchangeAdapter>,
    signature: NotFoundSignature,
    state: GuardState,
    pass_entries: Vec<TradeLogEntry>,
    pass_calls: usize,
}

impl Reconciler {
    pub fn new(settings: GuardianSettings, adapter: Arc<dyn ExchangeAdapter>) -> Self {
        let signature = adapter.not_found_signature();
        let state = GuardState::new(settings.trade_log_cap);
        Self {
            settings,
            adapter,
            signature,
            state,
            pass_entries: Vec::new(),
            pass_calls: 0,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GuardianSettings {
        &self.settings
    }

    /// Run one reconciliation pass.
    pub async fn run_pass(&mut self, trigger: PassTrigger) -> PassReport {
        self.state.seq += 1;
        self.pass_entries.clear();
        self.pass_calls = 0;
        debug!(seq = self.state.seq, trigger = trigger.label(), "Reconciliation pass");

        match trigger {
            PassTrigger::Startup => {
                info!(
                    symbol = %self.settings.symbol,
                    exchange = self.adapter.exchange_name(),
                    "Guardian started"
                );
                self.record(
                    TradeLogKind::Info,
                    format!(
                        "guardian started for {} on {}",
                        self.settings.symbol,
                        self.adapter.exchange_name()
                    ),
                );
                self.refresh_open_orders().await;
            }
            PassTrigger::Resync => self.refresh_open_orders().await,
            PassTrigger::Event(event) => self.merge(event),
            PassTrigger::SafetyNet => {}
        }

        let flat = self.state.position.is_flat();
        if flat {
            self.state.targets = None;
            self.cancel_all().await;
        } else {
            self.state.targets = compute_targets(&self.state.position, &self.settings.risk);
            if let Some(targets) = self.state.targets {
                self.adopt_existing(&targets);
                self.reconcile_stop(&targets).await;
                self.reconcile_trailing(&targets).await;
            }
        }

        let confirmed = self.stop_confirmed();
        if let Some(transition) = self.state.machine.evaluate(flat, confirmed) {
            info!(
                symbol = %self.settings.symbol,
                from = %transition.from,
                to = %transition.to,
                "Guard status changed"
            );
            self.record(
                TradeLogKind::Status,
                format!("{} -> {}", transition.from, transition.to),
            );
        }

        let log_entries = self.pass_entries.len();
        for entry in self.pass_entries.drain(..) {
            self.state.trade_log.push(entry);
        }

        PassReport {
            version: self.state.seq,
            adapter_calls: self.pass_calls,
            log_entries,
            status: self.state.machine.status(),
        }
    }

    /// Immutable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        let status = state.machine.status();
        let last_price = self.current_price();
        Snapshot {
            version: state.seq,
            symbol: self.settings.symbol.clone(),
            last_price,
            position: state.position,
            stop_order: state.stop.clone(),
            trailing_order: state.trailing.clone(),
            open_orders: state.open_orders.clone(),
            trade_log: state.trade_log.to_vec(),
            ready: state.position_seen && last_price.is_some(),
            guard_status: status,
            target_stop_price: state.targets.map(|t| t.stop_price),
            trailing_activation_price: state.targets.and_then(|t| t.trailing_activation),
            pnl: state.position.pnl(),
            requires_stop: !state.position.is_flat() && status != GuardStatus::Protecting,
        }
    }

    fn merge(&mut self, event: AdapterEvent) {
        if !event.symbol().eq_ignore_ascii_case(&self.settings.symbol) {
            debug!(symbol = event.symbol(), "Ignoring event for another symbol");
            return;
        }
        match event {
            AdapterEvent::Position(update) => {
                self.state.position = update.position;
                self.state.position_seen = true;
            }
            AdapterEvent::Price(tick) => self.state.last_price = Some(tick.price),
            AdapterEvent::Order(record) => self.merge_order(record),
        }
    }

    fn merge_order(&mut self, record: OrderRecord) {
        let seq = self.state.seq;
        for kind in SLOTS {
            let Some(order) = self.state.slot_mut(kind).as_mut() else {
                continue;
            };
            if order.id != record.id {
                continue;
            }
            if order.apply(&record, seq) && !order.is_active() {
                let status = order.status.clone().unwrap_or_default();
                let id = order.id.clone();
                *self.state.slot_mut(kind) = None;
                info!(order_id = %id, kind = %kind, status = %status, "Protective order closed");
                self.record(log_kind(kind), format!("{kind} order {id} {status}"));
            }
        }
        self.upsert_open_order(record);
    }

    fn upsert_open_order(&mut self, record: OrderRecord) {
        let orders = &mut self.state.open_orders;
        if let Some(index) = orders.iter().position(|r| r.id == record.id) {
            if record.update_time < orders[index].update_time {
                return;
            }
            orders.remove(index);
        }
        if record.is_active() {
            orders.push(record);
            sort_open_orders(orders);
        }
    }

    /// Take over protective orders already on the venue so a restart never
    /// stacks a second stop on top of an existing one.
    fn adopt_existing(&mut self, targets: &ProtectionTargets) {
        for kind in SLOTS {
            if self.state.slot(kind).is_some() {
                continue;
            }
            if kind == ProtectiveKind::Trailing && targets.trailing_activation.is_none() {
                continue;
            }
            let adopted = self
                .state
                .open_orders
                .iter()
                .filter(|r| {
                    r.is_active() && r.kind.protective() == Some(kind) && r.side == targets.exit_side
                })
                .find_map(|r| ProtectiveOrder::adopt(r, kind, self.state.seq));
            if let Some(order) = adopted {
                info!(order_id = %order.id, kind = %kind, trigger = %order.trigger_price, "Adopted existing order");
                self.record(
                    TradeLogKind::Info,
                    format!("adopted {kind} {} @ {}", order.id, order.trigger_price),
                );
                *self.state.slot_mut(kind) = Some(order);
            }
        }
    }

    async fn reconcile_stop(&mut self, targets: &ProtectionTargets) {
        if let Some(existing) = self.state.stop.clone() {
            let Some(reason) = stale_reason(
                &existing,
                targets.stop_price,
                targets,
                self.settings.price_tolerance,
            ) else {
                return;
            };
            info!(order_id = %existing.id, reason, target = %targets.stop_price, "Replacing stop");
            if !self.remove(&existing, reason).await {
                return;
            }
        }
        let spec = OrderSpec::stop(
            &self.settings.symbol,
            targets.exit_side,
            targets.stop_price,
            targets.quantity,
        );
        self.place(spec).await;
    }

    async fn reconcile_trailing(&mut self, targets: &ProtectionTargets) {
        let (Some(activation), Some(params)) =
            (targets.trailing_activation, self.settings.risk.trailing)
        else {
            return;
        };

        if let Some(existing) = self.state.trailing.clone() {
            let Some(reason) =
                stale_reason(&existing, activation, targets, self.settings.price_tolerance)
            else {
                return;
            };
            info!(order_id = %existing.id, reason, target = %activation, "Replacing trailing order");
            if !self.remove(&existing, reason).await {
                return;
            }
        }

        let Some(price) = self.current_price() else {
            return;
        };
        if !targets.trailing_armed(price) {
            return;
        }
        let spec = OrderSpec::trailing(
            &self.settings.symbol,
            targets.exit_side,
            activation,
            targets.quantity,
            params.callback_rate,
        );
        self.place(spec).await;
    }

    async fn cancel_all(&mut self) {
        for kind in SLOTS {
            if let Some(order) = self.state.slot(kind).clone() {
                self.remove(&order, "position flat").await;
            }
        }
    }

    /// Drop a remembered order, cancelling it on the venue if still active.
    /// Returns `false` when the cancel failed transiently and the order is
    /// kept for the next pass.
    async fn remove(&mut self, order: &ProtectiveOrder, reason: &str) -> bool {
        if order.is_active() {
            self.pass_calls += 1;
            let adapter = Arc::clone(&self.adapter);
            let result = with_timeout(
                "cancel_order",
                self.settings.adapter_timeout,
                adapter.cancel_order(&order.id),
            )
            .await;
            match result {
                Ok(()) => {
                    info!(order_id = %order.id, kind = %order.kind, reason, "Order cancelled");
                    self.record(
                        TradeLogKind::Cancel,
                        format!("cancelled {} {} ({reason})", order.kind, order.id),
                    );
                }
                Err(err) => match self.signature.classify(&err) {
                    ErrorClass::NotFound => {
                        info!(order_id = %order.id, kind = %order.kind, "Order already gone");
                        self.record(
                            TradeLogKind::Cancel,
                            format!("{} {} already gone ({reason})", order.kind, order.id),
                        );
                    }
                    ErrorClass::Transient => {
                        warn!(order_id = %order.id, kind = %order.kind, error = %err, "Cancel failed; retrying next pass");
                        self.record(
                            TradeLogKind::Error,
                            format!("cancel {} {} failed: {err}", order.kind, order.id),
                        );
                        return false;
                    }
                },
            }
        }
        *self.state.slot_mut(order.kind) = None;
        self.state.open_orders.retain(|r| r.id != order.id);
        true
    }

    /// Place a protective order. Failures are logged and left for the next
    /// pass; there is no synchronous retry.
    async fn place(&mut self, spec: OrderSpec) {
        let kind = spec.kind;
        self.pass_calls += 1;
        let adapter = Arc::clone(&self.adapter);
        let result = with_timeout(
            "place_order",
            self.settings.adapter_timeout,
            adapter.place_order(&spec),
        )
        .await;
        match result {
            Ok(id) => {
                info!(
                    order_id = %id,
                    kind = %kind,
                    side = %spec.side,
                    trigger = %spec.trigger_price,
                    quantity = %spec.quantity,
                    "Protective order placed"
                );
                self.record(
                    log_kind(kind),
                    format!(
                        "placed {kind} {} {} @ {} ({id})",
                        spec.side, spec.quantity, spec.trigger_price
                    ),
                );
                // Unstamped until the venue reports on it; any venue event replaces it.
                let order = ProtectiveOrder::acknowledged(id, &spec, self.state.seq, 0);
                let mut row = order.to_record(&self.settings.symbol);
                row.callback_rate = spec.callback_rate;
                self.upsert_open_order(row);
                *self.state.slot_mut(kind) = Some(order);
            }
            Err(err) => {
                warn!(kind = %kind, error = %err, "Placement failed; retrying next pass");
                self.record(
                    TradeLogKind::Error,
                    format!("{kind} placement failed: {err}"),
                );
            }
        }
    }

    /// Replace the open-order table with the venue's listing and forget
    /// remembered orders the venue no longer has.
    async fn refresh_open_orders(&mut self) {
        self.pass_calls += 1;
        let adapter = Arc::clone(&self.adapter);
        let symbol = self.settings.symbol.clone();
        let result = with_timeout(
            "query_open_orders",
            self.settings.adapter_timeout,
            adapter.query_open_orders(&symbol),
        )
        .await;

        let records = match result {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "Open order query failed");
                self.record(
                    TradeLogKind::Error,
                    format!("open order query failed: {err}"),
                );
                return;
            }
        };

        let mut listed: Vec<OrderRecord> = records
            .into_iter()
            .filter(|r| r.symbol.eq_ignore_ascii_case(&symbol) && r.is_active())
            .collect();
        sort_open_orders(&mut listed);

        for kind in SLOTS {
            let Some(order) = self.state.slot(kind) else {
                continue;
            };
            if listed.iter().any(|r| r.id == order.id) {
                continue;
            }
            let id = order.id.clone();
            *self.state.slot_mut(kind) = None;
            info!(order_id = %id, kind = %kind, "Order no longer listed by venue");
            self.record(
                TradeLogKind::Info,
                format!("{kind} {id} no longer listed by venue"),
            );
        }
        debug!(count = listed.len(), "Open orders refreshed");
        self.state.open_orders = listed;
    }

    fn stop_confirmed(&self) -> bool {
        let (Some(stop), Some(targets)) = (&self.state.stop, &self.state.targets) else {
            return false;
        };
        stop.is_active()
            && stop.side == targets.exit_side
            && stop.within_tolerance(targets.stop_price, self.settings.price_tolerance)
    }

    /// Last price event, falling back to the position's mark.
    fn current_price(&self) -> Option<Decimal> {
        self.state.last_price.or_else(|| {
            let mark = self.state.position.mark_price;
            (mark > Decimal::ZERO).then_some(mark)
        })
    }

    fn record(&mut self, kind: TradeLogKind, detail: String) {
        self.pass_entries.push(TradeLogEntry::new(kind, detail));
    }
}

/// Why a remembered order no longer matches its target, if it doesn't.
fn stale_reason(
    order: &ProtectiveOrder,
    target: Decimal,
    targets: &ProtectionTargets,
    tolerance: Decimal,
) -> Option<&'static str> {
    if !order.is_active() {
        Some("inactive")
    } else if order.side != targets.exit_side {
        Some("wrong side")
    } else if order.quantity != targets.quantity {
        Some("quantity changed")
    } else if !order.within_tolerance(target, tolerance) {
        Some("mispriced")
    } else {
        None
    }
}

/// Most recent first; ties broken by id, highest first. Rows the venue has
/// not stamped yet (update time 0) are the newest.
fn sort_open_orders(orders: &mut [OrderRecord]) {
    let recency = |r: &OrderRecord| {
        if r.update_time == 0 {
            i64::MAX
        } else {
            r.update_time
        }
    };
    orders.sort_by(|a, b| recency(b).cmp(&recency(a)).then_with(|| b.id.cmp(&a.id)));
}

const fn log_kind(kind: ProtectiveKind) -> TradeLogKind {
    match kind {
        ProtectiveKind::Stop => TradeLogKind::Stop,
        ProtectiveKind::Trailing => TradeLogKind::Trailing,
    }
}

/// Bound an adapter call; an elapsed deadline becomes a transient error.
async fn with_timeout<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T, AdapterError>>,
) -> Result<T, AdapterError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(AdapterError::timeout(operation, limit)))
}
