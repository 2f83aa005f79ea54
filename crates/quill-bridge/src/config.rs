//! Bridge configuration

use quill_bridge_core::{BridgeError, MESSAGE_PREFIX, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;

/// Configuration for one bridge instance
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Protocol prefix stamped on and expected from every message
    pub prefix: String,
    /// Interval of the acknowledgment health check, in milliseconds.
    /// `None` disables it; a missing acknowledgment then stalls silently.
    pub ack_timeout_ms: Option<u64>,
    /// Options handed to the editor engine on LOAD_EDITOR
    pub editor: EditorConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            prefix: MESSAGE_PREFIX.to_string(),
            ack_timeout_ms: None,
            editor: EditorConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            BridgeError::Config(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    pub fn ack_timeout(&self) -> Option<Duration> {
        self.ack_timeout_ms.map(Duration::from_millis)
    }
}

/// Editor construction options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub theme: String,
    /// Selector of the element that bounds editor popups
    pub bounds: String,
    /// Toolbar layout in the editor engine's format
    pub toolbar: Value,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            theme: "snow".into(),
            bounds: "#Quill-Editor-Container".into(),
            toolbar: json!([[
                "image",
                "bold",
                "italic",
                "underline",
                "strike",
                "clean",
                { "align": [] },
                { "color": [] },
                { "background": [] }
            ]]),
        }
    }
}
