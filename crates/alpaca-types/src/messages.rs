//! Request and response message types for the Alpaca streaming APIs

use crate::enums::ChannelKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ============================================================================
// Request Types
// ============================================================================

/// Authentication request sent immediately after the transport opens
///
/// Either key/secret or a bearer token (delegated-auth mode) is present,
/// never both.
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    /// Always "auth"
    pub action: &'static str,
    /// API key id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// API secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// OAuth bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthRequest {
    /// Key/secret authentication
    pub fn with_key(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            action: "auth",
            key: Some(key.into()),
            secret: Some(secret.into()),
            token: None,
        }
    }

    /// Bearer-token authentication
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            action: "auth",
            key: None,
            secret: None,
            token: Some(token.into()),
        }
    }
}

/// Subscribe or unsubscribe request
///
/// One symbol array per channel kind; kinds with no symbols are omitted
/// from the wire message entirely.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest {
    /// "subscribe" or "unsubscribe"
    pub action: &'static str,
    /// Per-kind symbol lists
    #[serde(flatten)]
    pub channels: BTreeMap<ChannelKind, Vec<String>>,
}

impl SubscribeRequest {
    /// Create a subscribe request
    pub fn subscribe(channels: BTreeMap<ChannelKind, Vec<String>>) -> Self {
        Self {
            action: "subscribe",
            channels,
        }
    }

    /// Create an unsubscribe request
    pub fn unsubscribe(channels: BTreeMap<ChannelKind, Vec<String>>) -> Self {
        Self {
            action: "unsubscribe",
            channels,
        }
    }

    /// Create a single-kind request
    pub fn single(action: &'static str, kind: ChannelKind, symbols: Vec<String>) -> Self {
        let mut channels = BTreeMap::new();
        channels.insert(kind, symbols);
        Self { action, channels }
    }
}

/// Listen request for the account event stream
#[derive(Debug, Clone, Serialize)]
pub struct ListenRequest {
    /// Always "listen"
    pub action: &'static str,
    /// Stream names to listen on
    pub data: ListenStreams,
}

/// Stream list payload of a [`ListenRequest`]
#[derive(Debug, Clone, Serialize)]
pub struct ListenStreams {
    /// Stream names (e.g. "trade_updates")
    pub streams: Vec<String>,
}

impl ListenRequest {
    /// Listen on the given streams
    pub fn new(streams: Vec<String>) -> Self {
        Self {
            action: "listen",
            data: ListenStreams { streams },
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Server subscription acknowledgment: the authoritative per-kind symbol sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionAck {
    /// Per-kind symbol lists as echoed by the server
    pub channels: BTreeMap<ChannelKind, Vec<String>>,
}

impl SubscriptionAck {
    /// Parse from a raw subscription frame
    ///
    /// Keys that are not channel names (the discriminator, server additions)
    /// are ignored; a malformed symbol list is treated as empty.
    pub fn from_value(value: &Value) -> Self {
        let mut channels = BTreeMap::new();
        if let Some(map) = value.as_object() {
            for (key, symbols) in map {
                if let Some(kind) = ChannelKind::from_wire_name(key) {
                    let symbols = symbols
                        .as_array()
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_owned)
                                .collect()
                        })
                        .unwrap_or_default();
                    channels.insert(kind, symbols);
                }
            }
        }
        Self { channels }
    }
}

/// One parsed frame from a stream message
///
/// Messages arrive as arrays of heterogeneous frames; each element is
/// classified here by its `T` discriminator.
#[derive(Debug, Clone)]
pub enum StreamFrame {
    /// `[{"T":"success","msg":...}]`
    Success {
        /// "connected" or "authenticated"
        msg: String,
    },
    /// `[{"T":"error","code":...,"msg":...}]`
    Error {
        /// Numeric error code, if present
        code: Option<u16>,
        /// Server-provided message
        msg: String,
    },
    /// `[{"T":"subscription","trades":[...],...}]`
    Subscription(SubscriptionAck),
    /// A data frame with a recognized discriminator
    Data {
        /// Channel kind resolved from the discriminator
        kind: ChannelKind,
        /// Raw record, still in wire field codes
        raw: Map<String, Value>,
    },
    /// A frame with no recognizable discriminator
    Unknown {
        /// The discriminator, if one was present
        discriminator: Option<String>,
    },
}

impl StreamFrame {
    /// Parse a whole message (array envelope or bare object) into frames
    pub fn parse_all(value: &Value) -> Vec<StreamFrame> {
        match value {
            Value::Array(items) => items.iter().map(Self::parse_one).collect(),
            Value::Object(_) => vec![Self::parse_one(value)],
            _ => vec![StreamFrame::Unknown {
                discriminator: None,
            }],
        }
    }

    /// Classify a single frame by its `T` field
    pub fn parse_one(value: &Value) -> StreamFrame {
        let discriminator = value.get("T").and_then(Value::as_str);
        match discriminator {
            Some("success") => StreamFrame::Success {
                msg: value
                    .get("msg")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            Some("error") => StreamFrame::Error {
                code: value
                    .get("code")
                    .and_then(Value::as_u64)
                    .map(|c| c as u16),
                msg: value
                    .get("msg")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            Some("subscription") => StreamFrame::Subscription(SubscriptionAck::from_value(value)),
            Some(t) => match ChannelKind::from_discriminator(t) {
                Some(kind) => StreamFrame::Data {
                    kind,
                    raw: value.as_object().cloned().unwrap_or_default(),
                },
                None => StreamFrame::Unknown {
                    discriminator: Some(t.to_string()),
                },
            },
            None => StreamFrame::Unknown {
                discriminator: None,
            },
        }
    }
}

/// Envelope of the account event stream (`{"stream":...,"data":{...}}`)
#[derive(Debug, Clone, Deserialize)]
pub struct AccountEnvelope {
    /// Stream name ("authorization", "listening", "trade_updates")
    pub stream: String,
    /// Stream-specific payload
    #[serde(default)]
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_request_key_secret() {
        let req = AuthRequest::with_key("AK123", "shh");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            json!({"action": "auth", "key": "AK123", "secret": "shh"})
        );
    }

    #[test]
    fn test_auth_request_bearer() {
        let req = AuthRequest::with_token("tok");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, json!({"action": "auth", "token": "tok"}));
    }

    #[test]
    fn test_subscribe_request_serialization() {
        let mut channels = BTreeMap::new();
        channels.insert(ChannelKind::Trades, vec!["AAPL".to_string()]);
        channels.insert(ChannelKind::UpdatedBars, vec!["MSFT".to_string()]);
        let req = SubscribeRequest::subscribe(channels);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "subscribe");
        assert_eq!(json["trades"], json!(["AAPL"]));
        assert_eq!(json["updatedBars"], json!(["MSFT"]));
        assert!(json.get("quotes").is_none());
    }

    #[test]
    fn test_parse_success_and_error_frames() {
        let msg = json!([
            {"T": "success", "msg": "connected"},
            {"T": "error", "code": 402, "msg": "auth failed"}
        ]);
        let frames = StreamFrame::parse_all(&msg);
        assert_eq!(frames.len(), 2);
        assert!(matches!(&frames[0], StreamFrame::Success { msg } if msg == "connected"));
        assert!(
            matches!(&frames[1], StreamFrame::Error { code: Some(402), msg } if msg == "auth failed")
        );
    }

    #[test]
    fn test_parse_subscription_ack_ignores_discriminator() {
        let msg = json!({"T": "subscription", "trades": ["AAPL"], "quotes": []});
        let frames = StreamFrame::parse_all(&msg);
        match &frames[0] {
            StreamFrame::Subscription(ack) => {
                assert_eq!(
                    ack.channels.get(&ChannelKind::Trades),
                    Some(&vec!["AAPL".to_string()])
                );
                assert_eq!(ack.channels.get(&ChannelKind::Quotes), Some(&vec![]));
                assert_eq!(ack.channels.len(), 2);
            }
            other => panic!("expected subscription ack, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_data_frame() {
        let msg = json!([{"T": "q", "S": "AAPL", "bp": 144.5}]);
        let frames = StreamFrame::parse_all(&msg);
        match &frames[0] {
            StreamFrame::Data { kind, raw } => {
                assert_eq!(*kind, ChannelKind::Quotes);
                assert_eq!(raw.get("S"), Some(&json!("AAPL")));
            }
            other => panic!("expected data frame, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_discriminator() {
        let msg = json!([{"T": "??", "S": "AAPL"}]);
        let frames = StreamFrame::parse_all(&msg);
        assert!(matches!(
            &frames[0],
            StreamFrame::Unknown { discriminator: Some(d) } if d == "??"
        ));
    }

    #[test]
    fn test_listen_request() {
        let req = ListenRequest::new(vec!["trade_updates".to_string()]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            json!({"action": "listen", "data": {"streams": ["trade_updates"]}})
        );
    }
}
