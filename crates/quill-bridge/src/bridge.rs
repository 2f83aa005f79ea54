//! Bridge instance: inbound dispatch and ownership of all protocol state
//!
//! One [`Bridge`] owns the editor reference, the outbound queue with its
//! flow-control flag and the message counter. Nothing is shared between
//! instances.

use crate::codec::{self, Codec};
use crate::config::BridgeConfig;
use crate::editor::{
    Editor, EditorEvent, EditorEventReceiver, EditorEventSender, EditorFactory, TextChange,
};
use crate::handlers;
use crate::queue::OutboundQueue;
use crate::transport::Transport;
use quill_bridge_core::{BridgeError, Command, Event, LoadEditor, Result};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Whether LOAD_EDITOR has been processed
pub enum EditorState<E> {
    Absent,
    Present(E),
}

/// Bridge between the host transport and an editor engine
pub struct Bridge<F: EditorFactory, T: Transport> {
    config: BridgeConfig,
    factory: F,
    editor: EditorState<F::Editor>,
    outbound: OutboundQueue<T>,
    events: EditorEventSender,
}

impl<F: EditorFactory, T: Transport> Bridge<F, T> {
    /// Create a bridge with no editor loaded.
    ///
    /// The returned receiver yields the editor's notifications; feed them back
    /// through [`Bridge::handle_editor_event`] (the runner does this).
    pub fn new(config: BridgeConfig, factory: F, transport: T) -> (Self, EditorEventReceiver) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let outbound = OutboundQueue::new(Codec::new(config.prefix.clone()), transport);

        let bridge = Self {
            config,
            factory,
            editor: EditorState::Absent,
            outbound,
            events,
        };
        (bridge, events_rx)
    }

    /// Process one raw transport string.
    ///
    /// Never fails: foreign traffic is ignored and protocol errors are logged.
    pub fn handle_message(&mut self, raw: &str) {
        let preview: String = raw.chars().take(200).collect();
        debug!("[Host→Bridge] len={} json={}", raw.len(), preview);

        let message = match codec::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                debug!("Dropping undecodable message: {}", e);
                return;
            }
        };

        if message.prefix_str() != Some(self.outbound.prefix()) {
            trace!("Ignoring message with foreign prefix {:?}", message.prefix);
            return;
        }

        let kind = match message.kind {
            Some(Value::String(kind)) => kind,
            Some(other) => {
                error!("{}", BridgeError::UnknownCommand(other.to_string()));
                return;
            }
            None => {
                error!("{}", BridgeError::MissingType);
                return;
            }
        };

        let command = match Command::parse(&kind, message.payload) {
            Ok(command) => command,
            Err(e) => {
                error!("{}", e);
                return;
            }
        };

        let name = command.name();
        if let Err(e) = self.handle_command(command) {
            error!("Failed to handle {}: {}", name, e);
        }
    }

    /// Apply a parsed command
    pub fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::LoadEditor(load) => self.load_editor(load),
            Command::MessageAcknowledged => self.outbound.on_acknowledged(),
            Command::Editor(command) => match &mut self.editor {
                EditorState::Present(editor) => {
                    handlers::handle(command, editor, &mut self.outbound, &self.events)
                }
                EditorState::Absent => Err(BridgeError::EditorNotLoaded(command.name())),
            },
        }
    }

    /// Process one notification from the editor engine
    pub fn handle_editor_event(&mut self, event: EditorEvent) {
        let event = match event {
            EditorEvent::TextChanged(TextChange {
                delta,
                old_delta,
                source,
            }) => Event::TextChanged {
                delta,
                old_delta,
                source,
            },
            EditorEvent::CustomImageRequested => Event::CallCustomImageHandler,
        };

        if let Err(e) = self.outbound.enqueue(&event) {
            error!("Failed to send {}: {}", event.kind(), e);
        }
    }

    /// Construct the editor, subscribe to its changes and announce it
    pub fn load_editor(&mut self, load: LoadEditor) -> Result<()> {
        if self.is_loaded() {
            warn!("LOAD_EDITOR received with an editor already loaded, ignoring");
            return Err(BridgeError::EditorAlreadyLoaded);
        }

        let mut config = self.config.editor.clone();
        if let Some(theme) = load.theme {
            config.theme = theme;
        }

        info!("Loading editor (theme {})", config.theme);
        let mut editor = self.factory.create(&config)?;

        let events = self.events.clone();
        editor.on_text_change(Box::new(move |change: TextChange| {
            // Receiver gone means the bridge is shutting down
            let _ = events.send(EditorEvent::TextChanged(change));
        }));

        let delta = editor.contents();
        self.editor = EditorState::Present(editor);
        info!("Editor initialized");

        self.outbound.enqueue(&Event::EditorLoaded { delta })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.editor, EditorState::Present(_))
    }

    pub fn editor(&self) -> Option<&F::Editor> {
        match &self.editor {
            EditorState::Present(editor) => Some(editor),
            EditorState::Absent => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut F::Editor> {
        match &mut self.editor {
            EditorState::Present(editor) => Some(editor),
            EditorState::Absent => None,
        }
    }

    /// Whether the flow-control flag is open
    pub fn is_ready(&self) -> bool {
        self.outbound.is_ready()
    }

    /// Messages waiting for an acknowledgment slot
    pub fn pending(&self) -> usize {
        self.outbound.pending()
    }

    /// Identifier of the message awaiting acknowledgment
    pub fn in_flight(&self) -> Option<u64> {
        self.outbound.in_flight()
    }

    pub fn next_message_id(&self) -> u64 {
        self.outbound.next_message_id()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        self.outbound.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.outbound.transport_mut()
    }
}
