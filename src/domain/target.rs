//! Protection targets derived from a position and risk parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderSide;
use super::position::{Direction, Position};

/// How far from entry the stop sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum StopDistance {
    /// Fraction of entry price (0.02 = 2%).
    Percent(Decimal),
    /// Maximum loss in quote currency over the whole position.
    MaxLoss(Decimal),
}

impl StopDistance {
    /// Price offset from entry for a position of `quantity`.
    #[must_use]
    pub fn offset(self, entry_price: Decimal, quantity: Decimal) -> Decimal {
        match self {
            Self::Percent(fraction) => entry_price * fraction,
            Self::MaxLoss(loss) => {
                if quantity.is_zero() {
                    Decimal::ZERO
                } else {
                    loss / quantity
                }
            }
        }
    }

    #[must_use]
    pub const fn value(self) -> Decimal {
        match self {
            Self::Percent(v) | Self::MaxLoss(v) => v,
        }
    }
}

impl Default for StopDistance {
    fn default() -> Self {
        Self::Percent(Decimal::new(2, 2))
    }
}

/// Trailing take-profit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingParams {
    /// Favourable move from entry, as a fraction, that arms the trailing order.
    pub activation_pct: Decimal,
    /// Callback rate handed to the venue, in percent.
    pub callback_rate: Decimal,
}

/// Risk parameters used to compute targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskParams {
    pub stop_distance: StopDistance,
    /// `None` disables trailing protection.
    pub trailing: Option<TrailingParams>,
    /// Venue price increment; targets are rounded to it.
    pub price_tick: Decimal,
}

/// Where protection should be for the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProtectionTargets {
    pub direction: Direction,
    pub exit_side: OrderSide,
    pub quantity: Decimal,
    pub stop_price: Decimal,
    pub trailing_activation: Option<Decimal>,
}

impl ProtectionTargets {
    /// Whether `price` has moved far enough in the position's favour to arm
    /// the trailing order. Always `false` when trailing is disabled.
    #[must_use]
    pub fn trailing_armed(&self, price: Decimal) -> bool {
        match (self.trailing_activation, self.direction) {
            (Some(activation), Direction::Long) => price >= activation,
            (Some(activation), Direction::Short) => price <= activation,
            (None, _) => false,
        }
    }
}

/// Compute stop and trailing targets. `None` for a flat position.
#[must_use]
pub fn compute_targets(position: &Position, params: &RiskParams) -> Option<ProtectionTargets> {
    let direction = position.direction()?;
    let entry = position.entry_price;
    let quantity = position.quantity();
    let offset = params.stop_distance.offset(entry, quantity);

    let raw_stop = match direction {
        Direction::Long => entry - offset,
        Direction::Short => entry + offset,
    };
    let stop_price = round_to_tick(raw_stop, params.price_tick).max(min_price(params.price_tick));

    let trailing_activation = params.trailing.map(|trailing| {
        let move_by = entry * trailing.activation_pct;
        let raw = match direction {
            Direction::Long => entry + move_by,
            Direction::Short => entry - move_by,
        };
        round_to_tick(raw, params.price_tick).max(min_price(params.price_tick))
    });

    Some(ProtectionTargets {
        direction,
        exit_side: direction.exit_side(),
        quantity,
        stop_price,
        trailing_activation,
    })
}

/// Round `price` to the nearest multiple of `tick`. A non-positive tick
/// leaves the price untouched.
#[must_use]
pub fn round_to_tick(price: Decimal, tick: Decimal) -> Decimal {
    if tick <= Decimal::ZERO {
        return price;
    }
    ((price / tick).round() * tick).round_dp(tick.scale())
}

/// Smallest price a venue accepts for a trigger.
fn min_price(tick: Decimal) -> Decimal {
    if tick > Decimal::ZERO {
        tick
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params(stop: StopDistance, trailing: Option<TrailingParams>) -> RiskParams {
        RiskParams {
            stop_distance: stop,
            trailing,
            price_tick: dec!(0.01),
        }
    }

    #[test]
    fn long_stop_sits_below_entry() {
        let position = Position::new(dec!(2), dec!(100), dec!(100));
        let targets = compute_targets(&position, &params(StopDistance::Percent(dec!(0.02)), None))
            .unwrap();
        assert_eq!(targets.stop_price, dec!(98.00));
        assert_eq!(targets.exit_side, OrderSide::Sell);
        assert_eq!(targets.quantity, dec!(2));
        assert_eq!(targets.trailing_activation, None);
    }

    #[test]
    fn short_stop_sits_above_entry() {
        let position = Position::new(dec!(-1.5), dec!(250), dec!(250));
        let targets = compute_targets(&position, &params(StopDistance::Percent(dec!(0.01)), None))
            .unwrap();
        assert_eq!(targets.stop_price, dec!(252.50));
        assert_eq!(targets.exit_side, OrderSide::Buy);
        assert_eq!(targets.quantity, dec!(1.5));
    }

    #[test]
    fn max_loss_spreads_over_quantity() {
        let position = Position::new(dec!(4), dec!(100), dec!(100));
        let targets = compute_targets(&position, &params(StopDistance::MaxLoss(dec!(10)), None))
            .unwrap();
        assert_eq!(targets.stop_price, dec!(97.50));
    }

    #[test]
    fn trailing_activation_is_direction_aware() {
        let trailing = Some(TrailingParams {
            activation_pct: dec!(0.05),
            callback_rate: dec!(0.5),
        });
        let p = params(StopDistance::Percent(dec!(0.02)), trailing);

        let long = compute_targets(&Position::new(dec!(1), dec!(100), dec!(100)), &p).unwrap();
        assert_eq!(long.trailing_activation, Some(dec!(105.00)));
        assert!(!long.trailing_armed(dec!(104.99)));
        assert!(long.trailing_armed(dec!(105)));

        let short = compute_targets(&Position::new(dec!(-1), dec!(100), dec!(100)), &p).unwrap();
        assert_eq!(short.trailing_activation, Some(dec!(95.00)));
        assert!(short.trailing_armed(dec!(94)));
        assert!(!short.trailing_armed(dec!(96)));
    }

    #[test]
    fn flat_position_has_no_targets() {
        let p = params(StopDistance::Percent(dec!(0.02)), None);
        assert!(compute_targets(&Position::flat(), &p).is_none());
    }

    #[test]
    fn rounds_to_tick() {
        assert_eq!(round_to_tick(dec!(98.004), dec!(0.01)), dec!(98.00));
        assert_eq!(round_to_tick(dec!(98.006), dec!(0.01)), dec!(98.01));
        assert_eq!(round_to_tick(dec!(1234.3), dec!(0.5)), dec!(1234.5));
        assert_eq!(round_to_tick(dec!(98.006), Decimal::ZERO), dec!(98.006));
    }

    #[test]
    fn stop_never_goes_below_one_tick() {
        let position = Position::new(dec!(1), dec!(10), dec!(10));
        let targets =
            compute_targets(&position, &params(StopDistance::MaxLoss(dec!(50)), None)).unwrap();
        assert_eq!(targets.stop_price, dec!(0.01));
    }
}
