//! Position held on the exchange for the guarded symbol.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderSide;

/// Absolute amounts below this are treated as no position.
pub const FLAT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// Direction of a non-flat position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Side of the order that reduces a position in this direction.
    #[must_use]
    pub const fn exit_side(self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Sell,
            Self::Short => OrderSide::Buy,
        }
    }
}

/// Snapshot of the exchange position. Replaced wholesale on every position
/// event, never patched field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Signed position size: positive long, negative short.
    pub amount: Decimal,
    /// Average entry price.
    pub entry_price: Decimal,
    /// Mark price reported alongside the position.
    pub mark_price: Decimal,
}

impl Position {
    #[must_use]
    pub const fn new(amount: Decimal, entry_price: Decimal, mark_price: Decimal) -> Self {
        Self {
            amount,
            entry_price,
            mark_price,
        }
    }

    /// A position with no exposure.
    #[must_use]
    pub const fn flat() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }

    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.amount.abs() < FLAT_EPSILON
    }

    /// `None` when flat.
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        if self.is_flat() {
            None
        } else if self.amount.is_sign_positive() {
            Some(Direction::Long)
        } else {
            Some(Direction::Short)
        }
    }

    /// Unsigned size of the position.
    #[must_use]
    pub fn quantity(&self) -> Decimal {
        self.amount.abs()
    }

    /// Unrealized profit at the mark price: `(mark - entry) * |amount| * sign`.
    #[must_use]
    pub fn pnl(&self) -> Decimal {
        if self.is_flat() {
            return Decimal::ZERO;
        }
        (self.mark_price - self.entry_price) * self.amount
    }
}
