//! Editor engine collaborator
//!
//! The bridge does not know how the rich-text engine works. It only needs the
//! capability set below. Notifications from the engine (content changes,
//! overridden toolbar actions) come back to the bridge as [`EditorEvent`]s on
//! a channel, so they are processed one at a time alongside transport input.

use crate::config::EditorConfig;
use quill_bridge_core::{ChangeSource, Delta, Range, Result};
use serde_json::Value;
use tokio::sync::mpsc;

/// Content-change notification
#[derive(Debug, Clone, PartialEq)]
pub struct TextChange {
    pub delta: Delta,
    pub old_delta: Delta,
    pub source: ChangeSource,
}

/// Editor-originated event for the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    TextChanged(TextChange),
    /// The toolbar image action was invoked after the host overrode it
    CustomImageRequested,
}

pub type EditorEventSender = mpsc::UnboundedSender<EditorEvent>;
pub type EditorEventReceiver = mpsc::UnboundedReceiver<EditorEvent>;

/// Listener registered for content changes
pub type TextChangeListener = Box<dyn FnMut(TextChange) + Send>;

/// Replacement for a toolbar action
pub type ToolbarHandler = Box<dyn FnMut() + Send>;

/// Capability set of a loaded editor
pub trait Editor {
    /// Current document content
    fn contents(&self) -> Delta;

    /// Replace the whole document
    fn set_contents(&mut self, delta: Delta) -> Result<()>;

    /// Convert external markup into content operations
    fn convert_html(&self, html: &str) -> Result<Delta>;

    /// Current selection, `None` when the editor has no focus
    fn selection(&self) -> Option<Range>;

    /// Insert an embedded object (image, video...) at `index`
    fn insert_embed(&mut self, index: usize, kind: &str, value: Value) -> Result<()>;

    /// Override the toolbar action for `format`
    fn set_toolbar_handler(&mut self, format: &str, handler: ToolbarHandler) -> Result<()>;

    /// Set the placeholder text attribute on the editor root
    fn set_placeholder(&mut self, placeholder: &str);

    /// Subscribe to content changes
    fn on_text_change(&mut self, listener: TextChangeListener);

    /// JSON description of the editor handle, sent with EDITOR_SENT
    fn snapshot(&self) -> Value;
}

/// Constructs editors on LOAD_EDITOR
pub trait EditorFactory {
    type Editor: Editor;

    fn create(&mut self, config: &EditorConfig) -> Result<Self::Editor>;
}
