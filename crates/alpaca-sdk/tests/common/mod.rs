//! Common test fixtures for integration tests
//!
//! Contains sample JSON frames in the shapes the streaming servers send

use alpaca_sdk::prelude::*;

/// Control frame sent after the transport opens
pub const CONNECTED_FRAME: &str = r#"[{"T":"success","msg":"connected"}]"#;

/// Control frame sent after successful authentication
pub const AUTHENTICATED_FRAME: &str = r#"[{"T":"success","msg":"authenticated"}]"#;

/// Error frame for a connection limit breach
pub const CONNECTION_LIMIT_FRAME: &str =
    r#"[{"T":"error","code":406,"msg":"connection limit exceeded"}]"#;

/// Error frame for bad credentials
pub const AUTH_FAILED_FRAME: &str = r#"[{"T":"error","code":402,"msg":"auth failed"}]"#;

/// Subscription ack echoing the accepted per-kind symbol lists
pub const SUBSCRIPTION_ACK_FRAME: &str = r#"[{
    "T": "subscription",
    "trades": ["AAPL"],
    "quotes": ["AAPL", "MSFT"],
    "bars": []
}]"#;

/// A trade message using the wire's short field codes, including a field
/// this client has no table entry for ("vl")
pub const TRADE_FRAME: &str = r#"[{
    "T": "t",
    "S": "AAPL",
    "i": 96921,
    "x": "V",
    "p": 144.6,
    "s": 25,
    "t": "2021-02-22T15:51:44.208Z",
    "c": ["@", "I"],
    "z": "C",
    "vl": 3
}]"#;

/// A frame batch mixing a quote, a bar and an unknown discriminator
pub const MIXED_BATCH_FRAME: &str = r#"[
    {"T":"q","S":"MSFT","bx":"U","bp":390.1,"bs":2,"ax":"Q","ap":390.2,"as":3,"t":"2021-02-22T15:51:45.335Z"},
    {"T":"b","S":"SPY","o":443.1,"h":443.9,"l":442.8,"c":443.5,"v":210533,"t":"2021-02-22T15:52:00Z"},
    {"T":"zz","S":"SPY"}
]"#;

/// Parse a raw text frame into stream frames
pub fn parse_frames(text: &str) -> Vec<StreamFrame> {
    let value: serde_json::Value = serde_json::from_str(text).expect("fixture is valid JSON");
    StreamFrame::parse_all(&value)
}

/// Credentials used across tests
pub fn test_credentials() -> Credentials {
    Credentials::new("AKTEST", "secret").expect("valid test credentials")
}
