//! Outbound events (bridge -> host)

use crate::delta::{ChangeSource, Delta};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Wire names of the outbound events
pub mod names {
    pub const EDITOR_LOADED: &str = "EDITOR_LOADED";
    pub const EDITOR_SENT: &str = "EDITOR_SENT";
    pub const RECEIVE_DELTA: &str = "RECEIVE_DELTA";
    pub const TEXT_CHANGED: &str = "TEXT_CHANGED";
    pub const CALL_CUSTOM_IMAGE_HANDLER: &str = "CALL_CUSTOM_IMAGE_HANDLER";
}

/// Result marker carried in every event payload as `"type"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

/// An event sent to the host
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Editor constructed; carries its initial content
    EditorLoaded { delta: Delta },
    /// Snapshot of the editor handle
    EditorSent { editor: Value },
    /// Reply to GET_DELTA
    ReceiveDelta { delta: Delta },
    /// Editor content changed
    TextChanged {
        delta: Delta,
        old_delta: Delta,
        source: ChangeSource,
    },
    /// The overridden toolbar image action was invoked
    CallCustomImageHandler,
}

impl Event {
    /// Wire name of this event
    pub fn kind(&self) -> &'static str {
        match self {
            Event::EditorLoaded { .. } => names::EDITOR_LOADED,
            Event::EditorSent { .. } => names::EDITOR_SENT,
            Event::ReceiveDelta { .. } => names::RECEIVE_DELTA,
            Event::TextChanged { .. } => names::TEXT_CHANGED,
            Event::CallCustomImageHandler => names::CALL_CUSTOM_IMAGE_HANDLER,
        }
    }

    /// Wire payload of this event
    pub fn payload(&self) -> Value {
        match self {
            Event::EditorLoaded { delta } | Event::ReceiveDelta { delta } => json!({
                "type": Status::Success,
                "delta": delta,
            }),
            Event::EditorSent { editor } => json!({ "editor": editor }),
            Event::TextChanged {
                delta,
                old_delta,
                source,
            } => json!({
                "type": Status::Success,
                "delta": delta,
                "oldDelta": old_delta,
                "source": source,
            }),
            Event::CallCustomImageHandler => json!({ "type": Status::Success }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_changed_payload_shape() {
        let event = Event::TextChanged {
            delta: Delta::from_ops(vec![json!({ "insert": "a" })]),
            old_delta: Delta::empty(),
            source: ChangeSource::User,
        };

        assert_eq!(event.kind(), "TEXT_CHANGED");
        let payload = event.payload();
        assert_eq!(payload["type"], "success");
        assert_eq!(payload["source"], "user");
        assert_eq!(payload["delta"]["ops"][0]["insert"], "a");
        assert_eq!(payload["oldDelta"]["ops"], json!([]));
    }

    #[test]
    fn test_editor_sent_has_no_status() {
        let payload = Event::EditorSent {
            editor: json!({ "theme": "snow" }),
        }
        .payload();

        assert!(payload.get("type").is_none());
        assert_eq!(payload["editor"]["theme"], "snow");
    }

    #[test]
    fn test_custom_image_handler_payload() {
        assert_eq!(
            Event::CallCustomImageHandler.payload(),
            json!({ "type": "success" })
        );
    }
}
