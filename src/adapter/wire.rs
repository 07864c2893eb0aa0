//! Broker payload normalization.
//!
//! Venues name the same order fields differently (`orderId` vs `id`,
//! `stopPrice` vs `triggerPrice`, ...) and send numbers either as JSON
//! numbers or numeric strings. These shapes absorb the variants once so the
//! rest of the crate only ever sees [`OrderRecord`] and [`AdapterError`].
//!
//! Example order payload:
//! ```json
//! {"orderId":8389765,"symbol":"BTCUSDT","side":"SELL","type":"STOP_MARKET",
//!  "status":"NEW","price":"0","stopPrice":"98.00","origQty":"2","updateTime":1700000000000}
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{OrderId, OrderKind, OrderRecord, OrderSide, Position};
use crate::error::{AdapterError, Error};
use crate::port::PositionUpdate;

/// A number sent either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    Number(serde_json::Number),
    Text(String),
}

impl WireNumber {
    /// Parse as a decimal. `None` for empty or unparseable values.
    #[must_use]
    pub fn decimal(&self) -> Option<Decimal> {
        let raw = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        };
        if raw.is_empty() {
            return None;
        }
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .ok()
    }

    #[must_use]
    pub fn integer(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    fn text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

/// First candidate that parses to a non-zero decimal.
fn first_price(candidates: &[&Option<WireNumber>]) -> Option<Decimal> {
    candidates
        .iter()
        .filter_map(|c| c.as_ref().and_then(WireNumber::decimal))
        .find(|d| !d.is_zero())
}

/// Broker order object with field-name variants.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    #[serde(alias = "id")]
    pub order_id: WireNumber,
    pub symbol: String,
    pub side: String,
    #[serde(rename = "type", alias = "orderType", default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub stop_price: Option<WireNumber>,
    #[serde(default)]
    pub trigger_price: Option<WireNumber>,
    #[serde(default)]
    pub price: Option<WireNumber>,
    #[serde(default)]
    pub activate_price: Option<WireNumber>,
    #[serde(default)]
    pub activation_price: Option<WireNumber>,
    #[serde(default)]
    pub price_rate: Option<WireNumber>,
    #[serde(default)]
    pub callback_rate: Option<WireNumber>,
    #[serde(default)]
    pub orig_qty: Option<WireNumber>,
    #[serde(default)]
    pub quantity: Option<WireNumber>,
    #[serde(default)]
    pub update_time: Option<WireNumber>,
    #[serde(default)]
    pub time: Option<WireNumber>,
}

impl TryFrom<WireOrder> for OrderRecord {
    type Error = Error;

    fn try_from(wire: WireOrder) -> Result<Self, Self::Error> {
        let id = wire.order_id.text();
        if id.is_empty() {
            return Err(Error::Parse("order without id".to_string()));
        }
        let side = OrderSide::from_str(&wire.side).map_err(Error::Parse)?;
        let quantity = [&wire.orig_qty, &wire.quantity]
            .into_iter()
            .find_map(|q| q.as_ref().and_then(WireNumber::decimal))
            .ok_or_else(|| Error::Parse(format!("order {id} without quantity")))?;
        let update_time = [&wire.update_time, &wire.time]
            .into_iter()
            .find_map(|t| t.as_ref().and_then(WireNumber::integer))
            .unwrap_or(0);

        Ok(Self {
            id: OrderId::new(id),
            symbol: wire.symbol,
            side,
            kind: wire
                .order_type
                .as_deref()
                .map_or_else(|| OrderKind::Other(String::new()), OrderKind::parse),
            status: wire.status.filter(|s| !s.trim().is_empty()),
            trigger_price: first_price(&[&wire.stop_price, &wire.trigger_price, &wire.price]),
            activation_price: first_price(&[&wire.activate_price, &wire.activation_price]),
            callback_rate: first_price(&[&wire.price_rate, &wire.callback_rate]),
            quantity,
            update_time,
        })
    }
}

/// Parse a single order object.
pub fn parse_order(json: &str) -> Result<OrderRecord, Error> {
    let wire: WireOrder = serde_json::from_str(json)?;
    OrderRecord::try_from(wire)
}

/// Parse an array of order objects, as returned by an open-orders query.
pub fn parse_orders(json: &str) -> Result<Vec<OrderRecord>, Error> {
    let wire: Vec<WireOrder> = serde_json::from_str(json)?;
    wire.into_iter().map(OrderRecord::try_from).collect()
}

/// Broker position object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePosition {
    pub symbol: String,
    #[serde(alias = "amount", alias = "size")]
    pub position_amt: WireNumber,
    #[serde(default)]
    pub entry_price: Option<WireNumber>,
    #[serde(default)]
    pub mark_price: Option<WireNumber>,
}

impl TryFrom<WirePosition> for PositionUpdate {
    type Error = Error;

    fn try_from(wire: WirePosition) -> Result<Self, Self::Error> {
        let amount = wire
            .position_amt
            .decimal()
            .ok_or_else(|| Error::Parse(format!("bad position amount for {}", wire.symbol)))?;
        let decimal_or_zero =
            |v: &Option<WireNumber>| v.as_ref().and_then(WireNumber::decimal).unwrap_or_default();
        Ok(Self {
            position: Position::new(
                amount,
                decimal_or_zero(&wire.entry_price),
                decimal_or_zero(&wire.mark_price),
            ),
            symbol: wire.symbol,
        })
    }
}

/// Broker error body: `{"code": -2011, "msg": "Unknown order sent."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    #[serde(default)]
    pub code: Option<WireNumber>,
    #[serde(alias = "message", default)]
    pub msg: String,
}

impl From<WireError> for AdapterError {
    fn from(wire: WireError) -> Self {
        Self::new(wire.code.as_ref().and_then(WireNumber::integer), wire.msg)
    }
}

/// Normalize an error response body. Bodies that are not a JSON error
/// object become a code-less error carrying the raw text.
#[must_use]
pub fn parse_error_body(body: &str) -> AdapterError {
    match serde_json::from_str::<WireError>(body) {
        Ok(wire) => wire.into(),
        Err(_) => AdapterError::message(body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_futures_stop_order() {
        let record = parse_order(
            r#"{"orderId":8389765,"symbol":"BTCUSDT","side":"SELL","type":"STOP_MARKET",
                "status":"NEW","price":"0","stopPrice":"98.00","origQty":"2",
                "updateTime":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(record.id.as_str(), "8389765");
        assert_eq!(record.kind, OrderKind::StopMarket);
        assert_eq!(record.trigger_price, Some(dec!(98.00)));
        assert_eq!(record.quantity, dec!(2));
        assert_eq!(record.update_time, 1_700_000_000_000);
        assert!(record.is_active());
    }

    #[test]
    fn accepts_alternate_field_names() {
        let record = parse_order(
            r#"{"id":"abc-1","symbol":"ETHUSDT","side":"buy","orderType":"trailing_stop_market",
                "triggerPrice":2500.5,"activationPrice":"2400","callbackRate":0.8,
                "quantity":1.25,"time":"42"}"#,
        )
        .unwrap();
        assert_eq!(record.id.as_str(), "abc-1");
        assert_eq!(record.side, OrderSide::Buy);
        assert_eq!(record.kind, OrderKind::TrailingStopMarket);
        assert_eq!(record.trigger_price, Some(dec!(2500.5)));
        assert_eq!(record.activation_price, Some(dec!(2400)));
        assert_eq!(record.callback_rate, Some(dec!(0.8)));
        assert_eq!(record.quantity, dec!(1.25));
        assert_eq!(record.update_time, 42);
        assert_eq!(record.status, None);
    }

    #[test]
    fn rejects_order_without_quantity() {
        let err = parse_order(r#"{"orderId":1,"symbol":"X","side":"SELL"}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn rejects_unknown_side() {
        let err =
            parse_order(r#"{"orderId":1,"symbol":"X","side":"HOLD","origQty":"1"}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn parses_error_bodies() {
        let err = parse_error_body(r#"{"code":2020,"msg":"Order with the provided digest (0x1) could not be found."}"#);
        assert_eq!(err.code, Some(2020));

        let err = parse_error_body(r#"{"code":"-2011","message":"Unknown order sent."}"#);
        assert_eq!(err.code, Some(-2011));
        assert_eq!(err.message, "Unknown order sent.");

        let err = parse_error_body("  502 Bad Gateway ");
        assert_eq!(err.code, None);
        assert_eq!(err.message, "502 Bad Gateway");
    }

    #[test]
    fn parses_position() {
        let wire: WirePosition = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","positionAmt":"-0.5","entryPrice":"100","markPrice":"99"}"#,
        )
        .unwrap();
        let update = PositionUpdate::try_from(wire).unwrap();
        assert_eq!(update.position.amount, dec!(-0.5));
        assert_eq!(update.position.pnl(), dec!(0.5));
    }
}
