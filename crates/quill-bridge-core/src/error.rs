//! Error types for the bridge

use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Bridge error types
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Transport string is not well-formed JSON
    #[error("Decode error: {0}")]
    Decode(String),

    /// Prefix matched but the `type` is not part of the command set
    #[error("Unhandled message type received: {0}")]
    UnknownCommand(String),

    /// Prefix matched but no `type` field was present
    #[error("Message has no type")]
    MissingType,

    /// Known command with a payload that does not fit its shape
    #[error("Invalid payload for {command}: {reason}")]
    InvalidPayload {
        command: &'static str,
        reason: String,
    },

    /// Editor command arrived before LOAD_EDITOR
    #[error("Editor not loaded, cannot handle {0}")]
    EditorNotLoaded(&'static str),

    /// LOAD_EDITOR arrived while an editor already exists
    #[error("Editor already loaded")]
    EditorAlreadyLoaded,

    /// Editor collaborator failure
    #[error("Editor error: {0}")]
    Editor(String),

    /// Transport refused a message
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}
