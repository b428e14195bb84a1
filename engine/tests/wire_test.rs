//! Integration tests for JSON round-trip serialization of the upstream
//! and downstream wire types.

use l3_engine::{DeltaMsg, L2SnapshotMsg, L3Level, L3Snapshot, L3UpdateEnvelope, SubscriberCommand};
use rust_decimal_macros::dec;

#[test]
fn delta_msg_round_trip_preserves_order() {
    let json = r#"{
        "U": 157,
        "u": 160,
        "b": [["100.00", "5"], ["99.50", "0"]],
        "a": [["101.00", "2.25"]]
    }"#;

    let msg: DeltaMsg = serde_json::from_str(json).unwrap();
    assert_eq!(msg.first_update_id, 157);
    assert_eq!(msg.final_update_id, 160);
    assert_eq!(
        msg.b,
        vec![
            ("100.00".to_string(), "5".to_string()),
            ("99.50".to_string(), "0".to_string()),
        ]
    );
    assert_eq!(msg.a, vec![("101.00".to_string(), "2.25".to_string())]);
}

#[test]
fn snapshot_msg_round_trip() {
    let json = r#"{
        "lastUpdateId": 1027024,
        "bids": [["4.00000000", "431.00000000"]],
        "asks": [["4.00000200", "12.00000000"]]
    }"#;

    let msg: L2SnapshotMsg = serde_json::from_str(json).unwrap();
    assert_eq!(msg.last_update_id, 1027024);
    assert_eq!(msg.bids.len(), 1);
    assert_eq!(msg.asks.len(), 1);
}

#[test]
fn l3_update_envelope_serializes_expected_shape() {
    let level = L3Level {
        price: dec!(100.00),
        total_size: dec!(7.5),
        order_count: 2,
        orders: Some(vec![dec!(5), dec!(2.5)]),
        max_order: dec!(5),
        avg_order: dec!(3.75),
    };
    let snapshot = L3Snapshot {
        symbol: "ETHUSDT".to_string(),
        timestamp_ms: 1_700_000_000_000,
        bids: vec![level],
        asks: vec![],
    };
    let envelope = L3UpdateEnvelope::new(snapshot);

    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["type"], "l3_update");
    assert_eq!(json["data"]["symbol"], "ETHUSDT");
    assert_eq!(json["data"]["bids"][0]["order_count"], 2);
    assert_eq!(json["data"]["bids"][0]["orders"][0], "5");
    // Unpopulated `orders` is omitted entirely, not emitted as null.
    let bare = L3Level {
        price: dec!(1),
        total_size: dec!(1),
        order_count: 1,
        orders: None,
        max_order: dec!(1),
        avg_order: dec!(1),
    };
    let bare_json = serde_json::to_value(&bare).unwrap();
    assert!(bare_json.get("orders").is_none());
}

#[test]
fn switch_symbol_command_deserializes() {
    let json = r#"{"type": "switch_symbol", "symbol": "btcusdt"}"#;
    let cmd: SubscriberCommand = serde_json::from_str(json).unwrap();
    assert!(matches!(cmd, SubscriberCommand::SwitchSymbol { symbol } if symbol == "btcusdt"));
}

#[test]
fn refresh_precision_command_has_no_payload() {
    let json = r#"{"type": "refresh_precision"}"#;
    let cmd: SubscriberCommand = serde_json::from_str(json).unwrap();
    assert!(matches!(cmd, SubscriberCommand::RefreshPrecision));
}
