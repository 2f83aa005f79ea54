//! Wire codec for bridge messages
//!
//! Messages are serialized as JSON objects:
//! `{"messageID": 3, "prefix": "react-native-webview-quilljs", "type": "TEXT_CHANGED", "payload": {...}}`
//!
//! Every field is optional on decode. Whether a decoded message belongs to the
//! bridge is decided by the dispatcher, not here.

use quill_bridge_core::{BridgeError, Event, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message as it travels over the transport
///
/// Envelope fields are kept as raw JSON so that an odd `messageID` or a
/// non-string `type` never makes a message undecodable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "messageID", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(default)]
    pub payload: Value,
}

impl Message {
    /// `prefix` when it is a string
    pub fn prefix_str(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Value::as_str)
    }
}

/// Encoded outbound message, ready for the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub id: u64,
    pub kind: &'static str,
    pub text: String,
}

/// Stamps outbound events with the protocol prefix and a sequence number
#[derive(Debug, Clone)]
pub struct Codec {
    prefix: String,
    next_id: u64,
}

impl Codec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_id: 0,
        }
    }

    /// Protocol prefix this codec stamps
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Identifier the next encoded message will receive
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Serialize an event, consuming one sequence number.
    ///
    /// The counter only advances when serialization succeeds, so identifiers
    /// handed out are gapless.
    pub fn encode(&mut self, event: &Event) -> Result<Encoded> {
        let id = self.next_id;
        let message = Message {
            message_id: Some(Value::from(id)),
            prefix: Some(Value::String(self.prefix.clone())),
            kind: Some(Value::String(event.kind().to_string())),
            payload: event.payload(),
        };
        let text = serde_json::to_string(&message)?;
        self.next_id += 1;

        Ok(Encoded {
            id,
            kind: event.kind(),
            text,
        })
    }
}

/// Parse a transport string.
///
/// Fails with [`BridgeError::Decode`] when the string is not a JSON object;
/// callers treat that as foreign traffic.
pub fn decode(raw: &str) -> Result<Message> {
    serde_json::from_str(raw).map_err(|e| BridgeError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_bridge_core::{Delta, MESSAGE_PREFIX};
    use serde_json::json;

    #[test]
    fn test_encode_format() {
        let mut codec = Codec::new(MESSAGE_PREFIX);
        let encoded = codec
            .encode(&Event::ReceiveDelta {
                delta: Delta::empty(),
            })
            .unwrap();

        let value: Value = serde_json::from_str(&encoded.text).unwrap();
        assert_eq!(value["messageID"], 0);
        assert_eq!(value["prefix"], MESSAGE_PREFIX);
        assert_eq!(value["type"], "RECEIVE_DELTA");
        assert_eq!(value["payload"]["type"], "success");
        assert_eq!(value["payload"]["delta"], json!({ "ops": [] }));
    }

    #[test]
    fn test_ids_are_gapless() {
        let mut codec = Codec::new(MESSAGE_PREFIX);
        let ids: Vec<u64> = (0..5)
            .map(|_| codec.encode(&Event::CallCustomImageHandler).unwrap().id)
            .collect();

        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(codec.next_id(), 5);
    }

    #[test]
    fn test_decode_host_command() {
        let raw = r#"{"prefix":"react-native-webview-quilljs","type":"SET_PLACEHOLDER","payload":{"placeholder":"Hi"}}"#;
        let message = decode(raw).unwrap();

        assert_eq!(message.message_id, None);
        assert_eq!(message.prefix_str(), Some(MESSAGE_PREFIX));
        assert_eq!(message.kind, Some(json!("SET_PLACEHOLDER")));
        assert_eq!(message.payload["placeholder"], "Hi");
    }

    #[test]
    fn test_decode_missing_fields() {
        let message = decode(r#"{"hello":"world"}"#).unwrap();
        assert!(message.prefix.is_none());
        assert!(message.kind.is_none());
        assert!(message.payload.is_null());
    }

    #[test]
    fn test_decode_tolerates_odd_envelope_fields() {
        let raw = r#"{"messageID":-1,"prefix":"react-native-webview-quilljs","type":7}"#;
        let message = decode(raw).unwrap();

        assert_eq!(message.message_id, Some(json!(-1)));
        assert_eq!(message.prefix_str(), Some(MESSAGE_PREFIX));
        assert_eq!(message.kind, Some(json!(7)));

        let message = decode(r#"{"prefix":5,"type":"LOAD_EDITOR"}"#).unwrap();
        assert_eq!(message.prefix_str(), None);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for raw in ["", "not json", "{\"prefix\":", "42", "\"string\"", "null"] {
            match decode(raw) {
                Err(BridgeError::Decode(_)) => {}
                other => panic!("Expected decode error for {:?}, got {:?}", raw, other),
            }
        }
    }
}
