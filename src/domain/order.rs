//! Order types shared between the reconciliation loop and adapters.
//!
//! [`OrderRecord`] is the canonical row an adapter reports for any order on
//! the venue. [`ProtectiveOrder`] is the guardian's memory of a stop or
//! trailing order it placed or adopted.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::OrderId;
use super::status::is_order_active;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl OrderSide {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "BID" | "LONG" => Ok(Self::Buy),
            "SELL" | "ASK" | "SHORT" => Ok(Self::Sell),
            other => Err(format!("unknown order side '{other}'")),
        }
    }
}

/// Venue order type, reduced to what the guardian distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    StopMarket,
    TrailingStopMarket,
    Other(String),
}

impl OrderKind {
    /// Parse a venue type string (`STOP_MARKET`, `trailing_stop`, ...).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "STOP" | "STOP_MARKET" | "STOP_LOSS" => Self::StopMarket,
            "TRAILING_STOP" | "TRAILING_STOP_MARKET" => Self::TrailingStopMarket,
            _ => Self::Other(normalized),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::StopMarket => "STOP_MARKET",
            Self::TrailingStopMarket => "TRAILING_STOP_MARKET",
            Self::Other(name) => name,
        }
    }

    /// Which protective slot an order of this kind can fill, if any.
    #[must_use]
    pub fn protective(&self) -> Option<ProtectiveKind> {
        match self {
            Self::StopMarket => Some(ProtectiveKind::Stop),
            Self::TrailingStopMarket => Some(ProtectiveKind::Trailing),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two protective slots the guardian maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectiveKind {
    Stop,
    Trailing,
}

impl ProtectiveKind {
    #[must_use]
    pub fn order_kind(self) -> OrderKind {
        match self {
            Self::Stop => OrderKind::StopMarket,
            Self::Trailing => OrderKind::TrailingStopMarket,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Trailing => "trailing",
        }
    }
}

impl fmt::Display for ProtectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical open-order row, normalized at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub kind: OrderKind,
    /// Raw venue status; `None` when the venue omitted it.
    pub status: Option<String>,
    pub trigger_price: Option<Decimal>,
    pub activation_price: Option<Decimal>,
    pub callback_rate: Option<Decimal>,
    pub quantity: Decimal,
    /// Venue update time in milliseconds since the epoch.
    pub update_time: i64,
}

impl OrderRecord {
    #[must_use]
    pub fn is_active(&self) -> bool {
        is_order_active(self.status.as_deref())
    }

    /// The price that defines this order for the given protective slot:
    /// the trigger for stops, the activation price for trailing orders.
    #[must_use]
    pub fn protective_price(&self, kind: ProtectiveKind) -> Option<Decimal> {
        match kind {
            ProtectiveKind::Stop => self.trigger_price,
            ProtectiveKind::Trailing => self.activation_price.or(self.trigger_price),
        }
    }
}

/// Request to place a protective order. Always reduce-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSpec {
    pub symbol: String,
    pub side: OrderSide,
    pub kind: ProtectiveKind,
    /// Stop trigger, or activation price for trailing orders.
    pub trigger_price: Decimal,
    pub quantity: Decimal,
    /// Trailing callback in percent; only set for trailing orders.
    pub callback_rate: Option<Decimal>,
    pub reduce_only: bool,
}

impl OrderSpec {
    pub fn stop(
        symbol: impl Into<String>,
        side: OrderSide,
        trigger_price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            kind: ProtectiveKind::Stop,
            trigger_price,
            quantity,
            callback_rate: None,
            reduce_only: true,
        }
    }

    pub fn trailing(
        symbol: impl Into<String>,
        side: OrderSide,
        activation_price: Decimal,
        quantity: Decimal,
        callback_rate: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            kind: ProtectiveKind::Trailing,
            trigger_price: activation_price,
            quantity,
            callback_rate: Some(callback_rate),
            reduce_only: true,
        }
    }
}

/// A stop or trailing order the guardian is responsible for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectiveOrder {
    pub id: OrderId,
    pub side: OrderSide,
    pub kind: ProtectiveKind,
    pub trigger_price: Decimal,
    pub quantity: Decimal,
    pub status: Option<String>,
    /// Pass sequence number of the last mutation.
    pub last_update_seq: u64,
    /// Venue update time of the last applied order event, in ms.
    pub update_time: i64,
}

impl ProtectiveOrder {
    /// Build the remembered order from an acknowledged placement.
    #[must_use]
    pub fn acknowledged(id: OrderId, spec: &OrderSpec, seq: u64, update_time: i64) -> Self {
        Self {
            id,
            side: spec.side,
            kind: spec.kind,
            trigger_price: spec.trigger_price,
            quantity: spec.quantity,
            status: Some("NEW".to_string()),
            last_update_seq: seq,
            update_time,
        }
    }

    /// Adopt an order found on the venue. `None` if it carries no price for
    /// the slot it would fill.
    #[must_use]
    pub fn adopt(record: &OrderRecord, kind: ProtectiveKind, seq: u64) -> Option<Self> {
        let trigger_price = record.protective_price(kind)?;
        Some(Self {
            id: record.id.clone(),
            side: record.side,
            kind,
            trigger_price,
            quantity: record.quantity,
            status: record.status.clone(),
            last_update_seq: seq,
            update_time: record.update_time,
        })
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        is_order_active(self.status.as_deref())
    }

    #[must_use]
    pub fn within_tolerance(&self, target: Decimal, tolerance: Decimal) -> bool {
        (self.trigger_price - target).abs() <= tolerance
    }

    /// Merge a venue update for this order. Returns `true` if anything
    /// changed; updates older than the last applied one are ignored.
    pub fn apply(&mut self, record: &OrderRecord, seq: u64) -> bool {
        if record.update_time < self.update_time {
            return false;
        }
        let trigger_price = record
            .protective_price(self.kind)
            .unwrap_or(self.trigger_price);
        let changed = self.status != record.status
            || self.trigger_price != trigger_price
            || self.quantity != record.quantity;
        self.update_time = record.update_time;
        if changed {
            self.status = record.status.clone();
            self.trigger_price = trigger_price;
            self.quantity = record.quantity;
            self.last_update_seq = seq;
        }
        changed
    }

    /// Row for the open-orders table.
    #[must_use]
    pub fn to_record(&self, symbol: &str) -> OrderRecord {
        let (trigger_price, activation_price) = match self.kind {
            ProtectiveKind::Stop => (Some(self.trigger_price), None),
            ProtectiveKind::Trailing => (None, Some(self.trigger_price)),
        };
        OrderRecord {
            id: self.id.clone(),
            symbol: symbol.to_string(),
            side: self.side,
            kind: self.kind.order_kind(),
            status: self.status.clone(),
            trigger_price,
            activation_price,
            callback_rate: None,
            quantity: self.quantity,
            update_time: self.update_time,
        }
    }
}
