//! Broker payloads normalized at the adapter boundary feed the reconciler
//! unchanged.

mod support;

use guardian::adapter::wire::{parse_error_body, parse_orders, WirePosition};
use guardian::application::PassTrigger;
use guardian::domain::{GuardStatus, OrderKind};
use guardian::port::{AdapterEvent, ErrorClass, NotFoundSignature, PositionUpdate};
use guardian::testkit::domain::risk_with_trailing;
use rust_decimal_macros::dec;
use support::Harness;

const OPEN_ORDERS: &str = r#"[
    {"orderId": 11, "symbol": "BTCUSDT", "side": "SELL", "type": "STOP_MARKET",
     "status": "NEW", "price": "0", "stopPrice": "98.00", "origQty": "2",
     "updateTime": 1700000000000},
    {"orderId": 12, "symbol": "BTCUSDT", "side": "SELL", "type": "TRAILING_STOP_MARKET",
     "status": "NEW", "activatePrice": "105.00", "priceRate": "0.5", "origQty": "2",
     "updateTime": 1700000000500},
    {"orderId": 13, "symbol": "BTCUSDT", "side": "SELL", "type": "STOP_MARKET",
     "status": "CANCELED", "stopPrice": "90", "origQty": "2",
     "updateTime": 1700000000900}
]"#;

#[test]
fn open_order_listing_normalizes_price_fields() {
    let orders = parse_orders(OPEN_ORDERS).unwrap();

    assert_eq!(orders.len(), 3);
    assert_eq!(orders[0].trigger_price, Some(dec!(98.00)));
    assert_eq!(orders[1].kind, OrderKind::TrailingStopMarket);
    assert_eq!(orders[1].activation_price, Some(dec!(105.00)));
    assert_eq!(orders[1].callback_rate, Some(dec!(0.5)));
    assert!(!orders[2].is_active());
}

#[tokio::test]
async fn parsed_orders_are_adopted_after_restart() {
    let mut h = Harness::new(risk_with_trailing());
    h.venue.set_position(dec!(2), dec!(100));
    for order in parse_orders(OPEN_ORDERS).unwrap() {
        h.venue.seed_order(order);
    }

    h.pass(PassTrigger::Startup).await;
    let wire: WirePosition = serde_json::from_str(
        r#"{"symbol":"btcusdt","positionAmt":"2","entryPrice":"100","markPrice":"106"}"#,
    )
    .unwrap();
    let update = PositionUpdate::try_from(wire).unwrap();
    let report = h
        .pass(PassTrigger::Event(AdapterEvent::Position(update)))
        .await;

    assert_eq!(report.adapter_calls, 0);
    assert_eq!(report.status, GuardStatus::Protecting);
    let snapshot = h.reconciler.snapshot();
    assert_eq!(snapshot.stop_order.map(|o| o.id.to_string()), Some("11".to_string()));
    assert_eq!(
        snapshot.trailing_order.map(|o| o.id.to_string()),
        Some("12".to_string())
    );
    let listed: Vec<_> = snapshot.open_orders.iter().map(|r| r.id.to_string()).collect();
    assert_eq!(listed, ["12", "11"]);
}

#[test]
fn error_bodies_classify_by_code_or_phrase() {
    let signature = NotFoundSignature::default();

    let by_code = parse_error_body(r#"{"code":2020,"msg":"gone"}"#);
    assert_eq!(signature.classify(&by_code), ErrorClass::NotFound);

    let by_phrase = parse_error_body(
        r#"{"msg":"ORDER WITH THE PROVIDED DIGEST (0xdeadbeef) could not be found."}"#,
    );
    assert_eq!(signature.classify(&by_phrase), ErrorClass::NotFound);

    let unrelated = parse_error_body(r#"{"code":-2019,"msg":"Margin is insufficient."}"#);
    assert_eq!(signature.classify(&unrelated), ErrorClass::Transient);

    let gateway = parse_error_body("<html>502 Bad Gateway</html>");
    assert_eq!(signature.classify(&gateway), ErrorClass::Transient);
}
