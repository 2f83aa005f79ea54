//! Message bridge between a host application and a Quill editor embedded in a
//! webview
//!
//! This crate provides:
//! - Wire codec stamping the protocol prefix and message identifiers
//! - Outbound queue that keeps at most one message awaiting acknowledgment
//! - Inbound dispatcher routing host commands to the editor
//! - Editor and transport abstractions, with channel and line-based transports
//! - An async runner and an in-memory editor engine

pub mod bridge;
pub mod codec;
pub mod config;
pub mod editor;
pub mod handlers;
pub mod memory;
pub mod queue;
pub mod runner;
pub mod transport;

pub use bridge::{Bridge, EditorState};
pub use codec::{Codec, Message, decode};
pub use config::{BridgeConfig, EditorConfig};
pub use editor::{Editor, EditorEvent, EditorEventReceiver, EditorFactory, TextChange};
pub use memory::{MemoryEditor, MemoryEditorFactory};
pub use queue::OutboundQueue;
pub use runner::run;
pub use transport::{
    AsyncReader, ChannelReader, ChannelTransport, LineReader, RecordingTransport, Transport,
    writer_task,
};
