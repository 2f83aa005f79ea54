//! Inbound commands (host -> bridge)
//!
//! The wire carries a string `type` and a free-form `payload`. Parsing turns
//! that pair into a closed enum so every command is matched exhaustively.
//! Commands that need a loaded editor are grouped under [`EditorCommand`].

use crate::delta::Delta;
use crate::error::{BridgeError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Wire names of the inbound commands
pub mod names {
    pub const LOAD_EDITOR: &str = "LOAD_EDITOR";
    pub const SEND_EDITOR: &str = "SEND_EDITOR";
    pub const GET_DELTA: &str = "GET_DELTA";
    pub const SET_CONTENTS: &str = "SET_CONTENTS";
    pub const SET_HTML_CONTENTS: &str = "SET_HTML_CONTENTS";
    pub const SET_BACKGROUND_COLOR: &str = "SET_BACKGROUND_COLOR";
    pub const MESSAGE_ACKNOWLEDGED: &str = "MESSAGE_ACKNOWLEDGED";
    pub const SET_CUSTOM_IMAGE_HANDLER: &str = "SET_CUSTOM_IMAGE_HANDLER";
    pub const SET_PLACEHOLDER: &str = "SET_PLACEHOLDER";
    pub const APPEND_IMAGE: &str = "APPEND_IMAGE";
}

/// A command received from the host
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Construct the editor. Valid only while no editor exists.
    LoadEditor(LoadEditor),
    /// Host received the last message; release the next one
    MessageAcknowledged,
    /// Anything that operates on a loaded editor
    Editor(EditorCommand),
}

/// Commands that require a loaded editor
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    SendEditor,
    GetDelta,
    SetContents { delta: Delta },
    SetHtmlContents { html: String },
    SetBackgroundColor(SetBackgroundColor),
    SetCustomImageHandler,
    SetPlaceholder { placeholder: String },
    AppendImage(AppendImage),
}

/// LOAD_EDITOR payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoadEditor {
    /// Editor theme; the configured default is used when absent
    #[serde(default)]
    pub theme: Option<String>,
}

/// SET_BACKGROUND_COLOR payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBackgroundColor {
    #[serde(default)]
    pub background_color: Option<String>,
}

/// APPEND_IMAGE payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppendImage {
    /// Image source handed to the editor's image embed
    pub image: String,
}

#[derive(Deserialize)]
struct SetContentsPayload {
    delta: Delta,
}

#[derive(Deserialize)]
struct SetHtmlContentsPayload {
    html: String,
}

#[derive(Deserialize)]
struct SetPlaceholderPayload {
    placeholder: String,
}

impl Command {
    /// Build a command from a wire `type` and `payload`.
    ///
    /// Unspecified payload fields are ignored. Commands without a payload
    /// ignore whatever was sent.
    pub fn parse(kind: &str, payload: Value) -> Result<Command> {
        use names::*;

        let command = match kind {
            LOAD_EDITOR => {
                let load = if payload.is_null() {
                    LoadEditor::default()
                } else {
                    payload_as(LOAD_EDITOR, payload)?
                };
                Command::LoadEditor(load)
            }
            MESSAGE_ACKNOWLEDGED => Command::MessageAcknowledged,
            SEND_EDITOR => Command::Editor(EditorCommand::SendEditor),
            GET_DELTA => Command::Editor(EditorCommand::GetDelta),
            SET_CONTENTS => {
                let p: SetContentsPayload = payload_as(SET_CONTENTS, payload)?;
                Command::Editor(EditorCommand::SetContents { delta: p.delta })
            }
            SET_HTML_CONTENTS => {
                let p: SetHtmlContentsPayload = payload_as(SET_HTML_CONTENTS, payload)?;
                Command::Editor(EditorCommand::SetHtmlContents { html: p.html })
            }
            SET_BACKGROUND_COLOR => {
                let color = if payload.is_null() {
                    SetBackgroundColor::default()
                } else {
                    payload_as(SET_BACKGROUND_COLOR, payload)?
                };
                Command::Editor(EditorCommand::SetBackgroundColor(color))
            }
            SET_CUSTOM_IMAGE_HANDLER => Command::Editor(EditorCommand::SetCustomImageHandler),
            SET_PLACEHOLDER => {
                let p: SetPlaceholderPayload = payload_as(SET_PLACEHOLDER, payload)?;
                Command::Editor(EditorCommand::SetPlaceholder {
                    placeholder: p.placeholder,
                })
            }
            APPEND_IMAGE => Command::Editor(EditorCommand::AppendImage(payload_as(
                APPEND_IMAGE,
                payload,
            )?)),
            other => return Err(BridgeError::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }

    /// Wire name of this command
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadEditor(_) => names::LOAD_EDITOR,
            Command::MessageAcknowledged => names::MESSAGE_ACKNOWLEDGED,
            Command::Editor(cmd) => cmd.name(),
        }
    }
}

impl EditorCommand {
    /// Wire name of this command
    pub fn name(&self) -> &'static str {
        match self {
            EditorCommand::SendEditor => names::SEND_EDITOR,
            EditorCommand::GetDelta => names::GET_DELTA,
            EditorCommand::SetContents { .. } => names::SET_CONTENTS,
            EditorCommand::SetHtmlContents { .. } => names::SET_HTML_CONTENTS,
            EditorCommand::SetBackgroundColor(_) => names::SET_BACKGROUND_COLOR,
            EditorCommand::SetCustomImageHandler => names::SET_CUSTOM_IMAGE_HANDLER,
            EditorCommand::SetPlaceholder { .. } => names::SET_PLACEHOLDER,
            EditorCommand::AppendImage(_) => names::APPEND_IMAGE,
        }
    }
}

fn payload_as<T: DeserializeOwned>(command: &'static str, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| BridgeError::InvalidPayload {
        command,
        reason: e.to_string(),
    })
}
