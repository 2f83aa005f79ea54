//! # quill-bridge-core
//!
//! Core protocol types for the webview Quill bridge.
//!
//! This crate provides the foundational types shared by the bridge and its hosts:
//! - Document deltas, selection ranges and change sources
//! - Inbound commands (host -> bridge)
//! - Outbound events (bridge -> host)
//! - Error taxonomy

pub mod command;
pub mod delta;
pub mod error;
pub mod event;

pub use command::{AppendImage, Command, EditorCommand, LoadEditor, SetBackgroundColor};
pub use delta::{ChangeSource, Delta, Range};
pub use error::{BridgeError, Result};
pub use event::{Event, Status};

/// Protocol constant stamped on every bridge message.
///
/// Distinguishes bridge traffic from anything else sharing the transport.
pub const MESSAGE_PREFIX: &str = "react-native-webview-quilljs";
