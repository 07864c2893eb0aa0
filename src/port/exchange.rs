//! Exchange port for position, order and price streams plus order actions.
//!
//! The guardian never talks to a venue directly. Everything it needs goes
//! through [`ExchangeAdapter`], and every event the venue produces arrives as
//! an [`AdapterEvent`] on an [`EventSink`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use super::not_found::NotFoundSignature;
use crate::domain::{OrderId, OrderRecord, OrderSpec, Position, SubscriptionId};
use crate::error::AdapterError;

/// Stream an event handler can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Position,
    Order,
    Price,
}

impl EventKind {
    pub const ALL: [Self; 3] = [Self::Position, Self::Order, Self::Price];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Order => "order",
            Self::Price => "price",
        }
    }
}

/// Position update for one symbol. The position replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionUpdate {
    pub symbol: String,
    pub position: Position,
}

/// Last traded or mark price for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTick {
    pub symbol: String,
    pub price: Decimal,
}

/// Events delivered by an adapter, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    Position(PositionUpdate),
    Order(OrderRecord),
    Price(PriceTick),
}

impl AdapterEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Position(_) => EventKind::Position,
            Self::Order(_) => EventKind::Order,
            Self::Price(_) => EventKind::Price,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Position(update) => &update.symbol,
            Self::Order(record) => &record.symbol,
            Self::Price(tick) => &tick.symbol,
        }
    }
}

/// Handler side of a subscription: a clone of the engine's event queue.
///
/// Delivery never blocks the adapter. Once the engine has stopped the queue
/// is closed and [`EventSink::deliver`] returns `false`.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<AdapterEvent>,
}

impl EventSink {
    #[must_use]
    pub const fn new(tx: mpsc::UnboundedSender<AdapterEvent>) -> Self {
        Self { tx }
    }

    /// Push an event onto the queue. Returns `false` if the consumer is gone.
    pub fn deliver(&self, event: AdapterEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Exchange adapter consumed by the guardian.
///
/// Implementations normalize venue payloads into domain types before they
/// reach the engine (see [`crate::adapter::wire`]).
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Register `sink` for events of `kind`.
    async fn subscribe(
        &self,
        kind: EventKind,
        sink: EventSink,
    ) -> Result<SubscriptionId, AdapterError>;

    /// Remove a handler. Unknown ids are ignored.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), AdapterError>;

    /// Place a reduce-only protective order.
    async fn place_order(&self, spec: &OrderSpec) -> Result<OrderId, AdapterError>;

    /// Cancel an order by id.
    async fn cancel_order(&self, id: &OrderId) -> Result<(), AdapterError>;

    /// Open orders for `symbol`, in the venue's order.
    async fn query_open_orders(&self, symbol: &str) -> Result<Vec<OrderRecord>, AdapterError>;

    /// How this venue reports "the referenced order does not exist".
    fn not_found_signature(&self) -> NotFoundSignature {
        NotFoundSignature::default()
    }

    /// Get the exchange name for logging/debugging.
    fn exchange_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sink_reports_closed_queue() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx);
        let tick = AdapterEvent::Price(PriceTick {
            symbol: "BTCUSDT".into(),
            price: dec!(100),
        });
        assert!(sink.deliver(tick.clone()));
        drop(rx);
        assert!(sink.is_closed());
        assert!(!sink.deliver(tick));
    }

    #[test]
    fn events_expose_kind_and_symbol() {
        let event = AdapterEvent::Position(PositionUpdate {
            symbol: "ETHUSDT".into(),
            position: Position::flat(),
        });
        assert_eq!(event.kind(), EventKind::Position);
        assert_eq!(event.symbol(), "ETHUSDT");
        assert_eq!(EventKind::Order.as_str(), "order");
    }
}
