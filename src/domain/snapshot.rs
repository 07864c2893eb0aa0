//! Immutable view of the guardian state after a reconciliation pass.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::guard::GuardStatus;
use super::order::{OrderRecord, ProtectiveOrder};
use super::position::Position;

/// Category of a trade-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeLogKind {
    Info,
    Stop,
    Trailing,
    Cancel,
    Status,
    Error,
}

impl fmt::Display for TradeLogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Stop => "stop",
            Self::Trailing => "trailing",
            Self::Cancel => "cancel",
            Self::Status => "status",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeLogEntry {
    pub time: DateTime<Utc>,
    pub kind: TradeLogKind,
    pub detail: String,
}

impl TradeLogEntry {
    pub fn new(kind: TradeLogKind, detail: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            kind,
            detail: detail.into(),
        }
    }
}

/// Append-only log capped at a fixed number of entries. The oldest entry is
/// evicted first; surviving entries keep their order.
#[derive(Debug, Clone)]
pub struct TradeLog {
    entries: VecDeque<TradeLogEntry>,
    cap: usize,
}

impl TradeLog {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap.min(1024)),
            cap,
        }
    }

    pub fn push(&mut self, entry: TradeLogEntry) {
        if self.cap == 0 {
            return;
        }
        while self.entries.len() >= self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TradeLogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<TradeLogEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Point-in-time guardian state handed to observers.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Pass sequence number that produced this snapshot.
    pub version: u64,
    pub symbol: String,
    pub last_price: Option<Decimal>,
    pub position: Position,
    pub stop_order: Option<ProtectiveOrder>,
    pub trailing_order: Option<ProtectiveOrder>,
    /// Most recent first.
    pub open_orders: Vec<OrderRecord>,
    /// Chronological, oldest first.
    pub trade_log: Vec<TradeLogEntry>,
    pub ready: bool,
    pub guard_status: GuardStatus,
    pub target_stop_price: Option<Decimal>,
    pub trailing_activation_price: Option<Decimal>,
    pub pnl: Decimal,
    pub requires_stop: bool,
}

impl Snapshot {
    /// State before the first pass.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            version: 0,
            symbol: symbol.into(),
            last_price: None,
            position: Position::flat(),
            stop_order: None,
            trailing_order: None,
            open_orders: Vec::new(),
            trade_log: Vec::new(),
            ready: false,
            guard_status: GuardStatus::Monitoring,
            target_stop_price: None,
            trailing_activation_price: None,
            pnl: Decimal::ZERO,
            requires_stop: false,
        }
    }
}
