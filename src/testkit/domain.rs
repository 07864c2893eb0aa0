//! Builders for domain primitives used across tests.
//!
//! Every fixture guards `BTCUSDT` with a 2% stop and a 0.01 price tick
//! unless a test asks for something else.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::application::GuardianSettings;
use crate::domain::{
    OrderId, OrderKind, OrderRecord, OrderSide, Position, RiskParams, StopDistance,
    TrailingParams,
};
use crate::port::{AdapterEvent, PositionUpdate, PriceTick};

pub const SYMBOL: &str = "BTCUSDT";

/// 2% stop, no trailing, 0.01 tick.
pub fn risk() -> RiskParams {
    RiskParams {
        stop_distance: StopDistance::Percent(Decimal::new(2, 2)),
        trailing: None,
        price_tick: Decimal::new(1, 2),
    }
}

/// [`risk`] plus a trailing order armed 5% from entry with a 0.5% callback.
pub fn risk_with_trailing() -> RiskParams {
    RiskParams {
        trailing: Some(TrailingParams {
            activation_pct: Decimal::new(5, 2),
            callback_rate: Decimal::new(5, 1),
        }),
        ..risk()
    }
}

/// Settings for [`SYMBOL`] with short timers so engine tests run quickly.
pub fn settings(risk: RiskParams) -> GuardianSettings {
    let mut settings = GuardianSettings::new(SYMBOL, risk);
    settings.safety_net_interval = Duration::from_millis(50);
    settings.adapter_timeout = Duration::from_millis(200);
    settings
}

pub fn position_event(amount: Decimal, entry_price: Decimal) -> AdapterEvent {
    AdapterEvent::Position(PositionUpdate {
        symbol: SYMBOL.to_string(),
        position: Position::new(amount, entry_price, entry_price),
    })
}

pub fn price_event(price: Decimal) -> AdapterEvent {
    AdapterEvent::Price(PriceTick {
        symbol: SYMBOL.to_string(),
        price,
    })
}

/// An active stop-market order resting on the venue.
pub fn stop_record(id: &str, side: OrderSide, trigger: Decimal, quantity: Decimal) -> OrderRecord {
    OrderRecord {
        id: OrderId::from(id),
        symbol: SYMBOL.to_string(),
        side,
        kind: OrderKind::StopMarket,
        status: Some("NEW".to_string()),
        trigger_price: Some(trigger),
        activation_price: None,
        callback_rate: None,
        quantity,
        update_time: 1,
    }
}

/// An active trailing-stop order resting on the venue.
pub fn trailing_record(
    id: &str,
    side: OrderSide,
    activation: Decimal,
    quantity: Decimal,
) -> OrderRecord {
    OrderRecord {
        kind: OrderKind::TrailingStopMarket,
        trigger_price: None,
        activation_price: Some(activation),
        callback_rate: Some(Decimal::new(5, 1)),
        ..stop_record(id, side, activation, quantity)
    }
}
