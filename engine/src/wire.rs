//! Wire types for the upstream exchange feed and the downstream L3
//! snapshot payload. Prices and quantities travel as strings end to end
//! so decimal precision survives JSON round-trips untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upstream REST snapshot: `GET .../depth?symbol=...&limit=1000`.
#[derive(Debug, Clone, Deserialize)]
pub struct L2SnapshotMsg {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: u64,
    #[serde(default)]
    pub bids: Vec<(String, String)>,
    #[serde(default)]
    pub asks: Vec<(String, String)>,
}

/// Upstream delta stream message.
///
/// `U` (first update id in the event) is carried for parity with the
/// upstream wire format but is not consulted by the reference
/// reconstruction policy — only `u` (final update id) advances
/// `last_update_id`. See the synchronizer's docs for why.
#[derive(Debug, Clone, Deserialize)]
pub struct DeltaMsg {
    #[serde(rename = "U")]
    pub first_update_id: u64,
    #[serde(rename = "u")]
    pub final_update_id: u64,
    #[serde(default)]
    pub b: Vec<(String, String)>,
    #[serde(default)]
    pub a: Vec<(String, String)>,
}

/// One price level in a downstream L3 snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct L3Level {
    pub price: Decimal,
    pub total_size: Decimal,
    pub order_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders: Option<Vec<Decimal>>,
    pub max_order: Decimal,
    pub avg_order: Decimal,
}

/// Full downstream L3 snapshot: one side is sorted best-to-worst.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct L3Snapshot {
    pub symbol: String,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    pub bids: Vec<L3Level>,
    pub asks: Vec<L3Level>,
}

/// Envelope wrapping a snapshot for the downstream subscriber push.
#[derive(Debug, Clone, Serialize)]
pub struct L3UpdateEnvelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: L3Snapshot,
}

impl L3UpdateEnvelope {
    pub fn new(snapshot: L3Snapshot) -> Self {
        Self {
            kind: "l3_update",
            data: snapshot,
        }
    }
}

/// Commands a downstream subscriber may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubscriberCommand {
    SwitchSymbol { symbol: String },
    ToggleKmeans { enabled: bool },
    RefreshPrecision,
}

/// Responses the server sends back to a subscriber command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubscriberResponse {
    SymbolSwitched { symbol: String },
    Error { message: String },
    KmeansToggled { enabled: bool },
    PrecisionRefreshed { symbol: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_msg_parses_binance_shaped_json() {
        let json = r#"{"U":100,"u":101,"b":[["100.00","5"]],"a":[]}"#;
        let msg: DeltaMsg = serde_json::from_str(json).unwrap();
        assert_eq!(msg.first_update_id, 100);
        assert_eq!(msg.final_update_id, 101);
        assert_eq!(msg.b, vec![("100.00".to_string(), "5".to_string())]);
        assert!(msg.a.is_empty());
    }

    #[test]
    fn snapshot_msg_parses() {
        let json = r#"{"lastUpdateId":42,"bids":[["1","2"]],"asks":[["3","4"]]}"#;
        let msg: L2SnapshotMsg = serde_json::from_str(json).unwrap();
        assert_eq!(msg.last_update_id, 42);
        assert_eq!(msg.bids, vec![("1".to_string(), "2".to_string())]);
    }

    #[test]
    fn subscriber_command_switch_symbol_round_trips() {
        let json = r#"{"type":"switch_symbol","symbol":"BTCUSDT"}"#;
        let cmd: SubscriberCommand = serde_json::from_str(json).unwrap();
        match cmd {
            SubscriberCommand::SwitchSymbol { symbol } => assert_eq!(symbol, "BTCUSDT"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn error_response_serializes_with_tag() {
        let resp = SubscriberResponse::Error {
            message: "boom".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"boom"}"#);
    }
}
