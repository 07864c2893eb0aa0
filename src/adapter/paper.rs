//! In-memory paper venue.
//!
//! Implements [`ExchangeAdapter`] against local state so the engine can run
//! end to end without a live exchange. Stop orders fill when the price
//! crosses their trigger; trailing orders rest until cancelled. Failures and
//! latency can be injected for the next call of each kind.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    round_to_tick, OrderId, OrderKind, OrderRecord, OrderSide, OrderSpec, Position,
    ProtectiveKind, SubscriptionId,
};
use crate::error::AdapterError;
use crate::port::{
    AdapterEvent, EventKind, EventSink, ExchangeAdapter, NotFoundSignature, PositionUpdate,
    PriceTick,
};

/// Adapter call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub place: usize,
    pub cancel: usize,
    pub query: usize,
}

impl CallCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.place + self.cancel + self.query
    }
}

#[derive(Default)]
struct PaperState {
    subscribers: Vec<(SubscriptionId, EventKind, EventSink)>,
    orders: BTreeMap<OrderId, OrderRecord>,
    position: Position,
    price: Option<Decimal>,
    clock: i64,
    place_failures: VecDeque<AdapterError>,
    cancel_failures: VecDeque<AdapterError>,
    query_failures: VecDeque<AdapterError>,
    place_delay: Option<Duration>,
    placed: Vec<OrderSpec>,
    cancelled: Vec<OrderId>,
    calls: CallCounts,
}

impl PaperState {
    /// Millisecond timestamps that never repeat, so update ordering holds
    /// even for events in the same millisecond.
    fn tick_clock(&mut self) -> i64 {
        self.clock = Utc::now().timestamp_millis().max(self.clock + 1);
        self.clock
    }

    fn emit(&mut self, event: AdapterEvent) {
        let kind = event.kind();
        self.subscribers
            .retain(|(_, _, sink)| !sink.is_closed());
        for (_, subscribed, sink) in &self.subscribers {
            if *subscribed == kind {
                sink.deliver(event.clone());
            }
        }
    }

    fn emit_position(&mut self, symbol: &str) {
        let update = PositionUpdate {
            symbol: symbol.to_string(),
            position: self.position,
        };
        self.emit(AdapterEvent::Position(update));
    }

    fn update_order(&mut self, id: &OrderId, status: &str) -> Option<OrderRecord> {
        let now = self.tick_clock();
        let mut record = self.orders.remove(id)?;
        record.status = Some(status.to_string());
        record.update_time = now;
        if record.is_active() {
            self.orders.insert(id.clone(), record.clone());
        }
        self.emit(AdapterEvent::Order(record.clone()));
        Some(record)
    }

    /// Fill every stop the price has crossed and shrink the position.
    fn trigger_stops(&mut self, symbol: &str, price: Decimal) {
        let crossed: Vec<OrderId> = self
            .orders
            .values()
            .filter(|r| r.kind == OrderKind::StopMarket)
            .filter(|r| match (r.side, r.trigger_price) {
                (OrderSide::Sell, Some(trigger)) => price <= trigger,
                (OrderSide::Buy, Some(trigger)) => price >= trigger,
                _ => false,
            })
            .map(|r| r.id.clone())
            .collect();

        for id in crossed {
            let Some(record) = self.update_order(&id, "FILLED") else {
                continue;
            };
            let signed = match record.side {
                OrderSide::Sell => -record.quantity,
                OrderSide::Buy => record.quantity,
            };
            let amount = self.position.amount + signed;
            // Reduce-only: a fill never flips the position.
            let amount = if amount.is_sign_negative() != self.position.amount.is_sign_negative() {
                Decimal::ZERO
            } else {
                amount
            };
            info!(order_id = %id, price = %price, "Paper stop filled");
            self.position = if amount.is_zero() {
                Position::flat()
            } else {
                Position::new(amount, self.position.entry_price, price)
            };
            self.emit_position(symbol);
        }
    }
}

pub struct PaperExchange {
    symbol: String,
    state: Mutex<PaperState>,
    next_subscription: AtomicU64,
    signature: NotFoundSignature,
}

impl PaperExchange {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            state: Mutex::new(PaperState::default()),
            next_subscription: AtomicU64::new(1),
            signature: NotFoundSignature::default(),
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Replace the position and publish it.
    pub fn set_position(&self, amount: Decimal, entry_price: Decimal) {
        let mut state = self.state.lock();
        let mark = state.price.unwrap_or(entry_price);
        state.position = Position::new(amount, entry_price, mark);
        if state.position.is_flat() {
            state.position = Position::flat();
        }
        state.emit_position(&self.symbol);
    }

    /// Publish a price. Crossed stops fill, then the position is republished
    /// at the new mark.
    pub fn set_price(&self, price: Decimal) {
        let mut state = self.state.lock();
        state.price = Some(price);
        state.emit(AdapterEvent::Price(PriceTick {
            symbol: self.symbol.clone(),
            price,
        }));
        state.trigger_stops(&self.symbol, price);
        if !state.position.is_flat() {
            state.position.mark_price = price;
            state.emit_position(&self.symbol);
        }
    }

    /// Put an order on the book without announcing it.
    pub fn seed_order(&self, record: OrderRecord) {
        self.state.lock().orders.insert(record.id.clone(), record);
    }

    /// Change an order's status and publish the update.
    pub fn set_order_status(&self, id: &OrderId, status: &str) -> Option<OrderRecord> {
        self.state.lock().update_order(id, status)
    }

    /// Drop an order silently, as if the venue lost track of it.
    pub fn forget_order(&self, id: &OrderId) -> Option<OrderRecord> {
        self.state.lock().orders.remove(id)
    }

    /// Publish an arbitrary order event without touching the book.
    pub fn push_order_event(&self, record: OrderRecord) {
        self.state.lock().emit(AdapterEvent::Order(record));
    }

    pub fn fail_next_place(&self, error: AdapterError) {
        self.state.lock().place_failures.push_back(error);
    }

    pub fn fail_next_cancel(&self, error: AdapterError) {
        self.state.lock().cancel_failures.push_back(error);
    }

    pub fn fail_next_query(&self, error: AdapterError) {
        self.state.lock().query_failures.push_back(error);
    }

    /// Delay every placement by `delay`; `None` removes the delay.
    pub fn set_place_delay(&self, delay: Option<Duration>) {
        self.state.lock().place_delay = delay;
    }

    /// Every accepted placement, oldest first.
    #[must_use]
    pub fn placed(&self) -> Vec<OrderSpec> {
        self.state.lock().placed.clone()
    }

    /// Every successful cancel, oldest first.
    #[must_use]
    pub fn cancelled(&self) -> Vec<OrderId> {
        self.state.lock().cancelled.clone()
    }

    #[must_use]
    pub fn open_orders(&self) -> Vec<OrderRecord> {
        self.state.lock().orders.values().cloned().collect()
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.state.lock().position
    }

    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state.lock();
        state.subscribers.retain(|(_, _, sink)| !sink.is_closed());
        state.subscribers.len()
    }

    /// Random-walk price feed. Stops when the venue is dropped or the handle
    /// is aborted.
    pub fn spawn_price_feed(
        self: &Arc<Self>,
        start_price: Decimal,
        interval: Duration,
        volatility: Decimal,
        tick: Decimal,
    ) -> JoinHandle<()> {
        let venue: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut price = start_price;
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(venue) = venue.upgrade() else {
                    debug!("Paper venue dropped; price feed ending");
                    break;
                };
                let step: f64 = rng.gen_range(-1.0..=1.0);
                let step = Decimal::try_from(step).unwrap_or(Decimal::ZERO);
                let next = round_to_tick(price + price * volatility * step, tick);
                if next > Decimal::ZERO {
                    price = next;
                }
                venue.set_price(price);
            }
        })
    }

    fn next_failure(queue: &mut VecDeque<AdapterError>) -> Result<(), AdapterError> {
        match queue.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for PaperExchange {
    async fn subscribe(
        &self,
        kind: EventKind,
        sink: EventSink,
    ) -> Result<SubscriptionId, AdapterError> {
        let id = SubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.state.lock().subscribers.push((id, kind, sink));
        debug!(subscription = %id, kind = kind.as_str(), "Paper subscription added");
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), AdapterError> {
        self.state.lock().subscribers.retain(|(sub, _, _)| *sub != id);
        Ok(())
    }

    async fn place_order(&self, spec: &OrderSpec) -> Result<OrderId, AdapterError> {
        let delay = self.state.lock().place_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.calls.place += 1;
        Self::next_failure(&mut state.place_failures)?;

        if !spec.reduce_only || state.position.is_flat() {
            return Err(AdapterError::with_code(-2022, "ReduceOnly Order is rejected."));
        }
        if !spec.symbol.eq_ignore_ascii_case(&self.symbol) {
            return Err(AdapterError::with_code(-1121, "Invalid symbol."));
        }

        let id = OrderId::new(Uuid::new_v4().simple().to_string());
        let (trigger_price, activation_price) = match spec.kind {
            ProtectiveKind::Stop => (Some(spec.trigger_price), None),
            ProtectiveKind::Trailing => (None, Some(spec.trigger_price)),
        };
        let update_time = state.tick_clock();
        let record = OrderRecord {
            id: id.clone(),
            symbol: self.symbol.clone(),
            side: spec.side,
            kind: spec.kind.order_kind(),
            status: Some("NEW".to_string()),
            trigger_price,
            activation_price,
            callback_rate: spec.callback_rate,
            quantity: spec.quantity,
            update_time,
        };
        state.orders.insert(id.clone(), record.clone());
        state.placed.push(spec.clone());
        state.emit(AdapterEvent::Order(record));
        Ok(id)
    }

    async fn cancel_order(&self, id: &OrderId) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.calls.cancel += 1;
        Self::next_failure(&mut state.cancel_failures)?;

        if !state.orders.contains_key(id) {
            return Err(AdapterError::with_code(
                self.signature.code,
                format!("Order with the provided digest (0x{id}) could not be found."),
            ));
        }
        state.update_order(id, "CANCELED");
        state.cancelled.push(id.clone());
        Ok(())
    }

    async fn query_open_orders(&self, symbol: &str) -> Result<Vec<OrderRecord>, AdapterError> {
        let mut state = self.state.lock();
        state.calls.query += 1;
        Self::next_failure(&mut state.query_failures)?;

        Ok(state
            .orders
            .values()
            .filter(|r| r.symbol.eq_ignore_ascii_case(symbol) && r.is_active())
            .cloned()
            .collect())
    }

    fn not_found_signature(&self) -> NotFoundSignature {
        self.signature
    }

    fn exchange_name(&self) -> &'static str {
        "paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn place_requires_an_open_position() {
        let venue = PaperExchange::new("BTCUSDT");
        let spec = OrderSpec::stop("BTCUSDT", OrderSide::Sell, dec!(98), dec!(1));
        let err = venue.place_order(&spec).await.unwrap_err();
        assert_eq!(err.code, Some(-2022));

        venue.set_position(dec!(1), dec!(100));
        let id = venue.place_order(&spec).await.unwrap();
        assert_eq!(venue.open_orders()[0].id, id);
        assert_eq!(venue.calls().place, 2);
    }

    #[tokio::test]
    async fn cancel_of_unknown_order_reports_not_found() {
        let venue = PaperExchange::new("BTCUSDT");
        let err = venue.cancel_order(&OrderId::from("abc")).await.unwrap_err();
        assert!(venue.not_found_signature().matches(&err));
        assert!(err.message.contains("0xabc"));
    }

    #[tokio::test]
    async fn crossing_price_fills_stop_and_flattens() {
        let venue = PaperExchange::new("BTCUSDT");
        let (tx, mut rx) = mpsc::unbounded_channel();
        venue
            .subscribe(EventKind::Order, EventSink::new(tx.clone()))
            .await
            .unwrap();
        venue
            .subscribe(EventKind::Position, EventSink::new(tx))
            .await
            .unwrap();

        venue.set_position(dec!(2), dec!(100));
        let spec = OrderSpec::stop("BTCUSDT", OrderSide::Sell, dec!(98), dec!(2));
        venue.place_order(&spec).await.unwrap();
        venue.set_price(dec!(97.5));

        assert!(venue.position().is_flat());
        assert!(venue.open_orders().is_empty());

        let mut filled = false;
        while let Ok(event) = rx.try_recv() {
            if let AdapterEvent::Order(record) = event {
                filled |= record.status.as_deref() == Some("FILLED");
            }
        }
        assert!(filled);
    }

    #[tokio::test]
    async fn injected_failures_apply_once() {
        let venue = PaperExchange::new("BTCUSDT");
        venue.fail_next_query(AdapterError::message("server busy"));
        assert!(venue.query_open_orders("BTCUSDT").await.is_err());
        assert!(venue.query_open_orders("BTCUSDT").await.is_ok());
        assert_eq!(venue.calls().query, 2);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let venue = PaperExchange::new("BTCUSDT");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = venue
            .subscribe(EventKind::Price, EventSink::new(tx))
            .await
            .unwrap();
        venue.unsubscribe(id).await.unwrap();
        venue.set_price(dec!(101));
        assert!(rx.try_recv().is_err());
        assert_eq!(venue.subscriber_count(), 0);
    }
}
