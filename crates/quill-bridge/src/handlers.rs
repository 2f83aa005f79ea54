//! Handlers for commands that operate on a loaded editor
//!
//! Each handler touches the editor and enqueues at most one event. Ordering
//! of outbound messages is left entirely to the [`OutboundQueue`].

use crate::editor::{Editor, EditorEvent, EditorEventSender};
use crate::queue::OutboundQueue;
use crate::transport::Transport;
use quill_bridge_core::{AppendImage, EditorCommand, Event, Result, SetBackgroundColor};
use serde_json::Value;
use tracing::debug;

/// Apply `command` to a present editor
pub fn handle<E: Editor, T: Transport>(
    command: EditorCommand,
    editor: &mut E,
    outbound: &mut OutboundQueue<T>,
    events: &EditorEventSender,
) -> Result<()> {
    match command {
        EditorCommand::SendEditor => outbound.enqueue(&Event::EditorSent {
            editor: editor.snapshot(),
        }),
        EditorCommand::GetDelta => outbound.enqueue(&Event::ReceiveDelta {
            delta: editor.contents(),
        }),
        EditorCommand::SetContents { delta } => editor.set_contents(delta),
        EditorCommand::SetHtmlContents { html } => {
            let converted = editor.convert_html(&html)?;
            if converted.ops().is_some() {
                editor.set_contents(converted)?;
            } else {
                debug!("Markup conversion produced no operations, content unchanged");
            }
            Ok(())
        }
        EditorCommand::SetBackgroundColor(SetBackgroundColor { background_color }) => {
            debug!("SET_BACKGROUND_COLOR ignored: {:?}", background_color);
            Ok(())
        }
        EditorCommand::SetCustomImageHandler => {
            let events = events.clone();
            editor.set_toolbar_handler(
                "image",
                Box::new(move || {
                    // Receiver gone means the bridge is shutting down
                    let _ = events.send(EditorEvent::CustomImageRequested);
                }),
            )
        }
        EditorCommand::SetPlaceholder { placeholder } => {
            editor.set_placeholder(&placeholder);
            Ok(())
        }
        EditorCommand::AppendImage(AppendImage { image }) => {
            let index = editor.selection().map_or(0, |range| range.index);
            editor.insert_embed(index, "image", Value::String(image))
        }
    }
}
