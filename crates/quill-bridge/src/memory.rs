//! In-memory editor engine
//!
//! A small stand-in for the real rich-text engine. The document is a flat list
//! of Quill insert operations; string inserts count one position per char and
//! embeds count one position each. Good enough to drive the bridge from the
//! CLI and from tests.

use crate::config::EditorConfig;
use crate::editor::{Editor, EditorFactory, TextChange, TextChangeListener, ToolbarHandler};
use quill_bridge_core::{ChangeSource, Delta, Range, Result};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const PLACEHOLDER_ATTRIBUTE: &str = "data-placeholder";

/// Editor document held in memory
pub struct MemoryEditor {
    config: EditorConfig,
    ops: Vec<Value>,
    selection: Option<Range>,
    root_attributes: BTreeMap<String, String>,
    toolbar_handlers: HashMap<String, ToolbarHandler>,
    listeners: Vec<TextChangeListener>,
}

impl MemoryEditor {
    /// Empty document (a single newline, like a fresh Quill instance)
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            ops: vec![json!({ "insert": "\n" })],
            selection: None,
            root_attributes: BTreeMap::new(),
            toolbar_handlers: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    /// Document length in positions
    pub fn length(&self) -> usize {
        self.ops.iter().map(op_len).sum()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_selection(&mut self, selection: Option<Range>) {
        self.selection = selection;
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.root_attributes
            .get(PLACEHOLDER_ATTRIBUTE)
            .map(String::as_str)
    }

    /// Simulate a click on the toolbar button for `format`.
    ///
    /// Returns false when no handler overrides the built-in action.
    pub fn invoke_toolbar(&mut self, format: &str) -> bool {
        match self.toolbar_handlers.get_mut(format) {
            Some(handler) => {
                handler();
                true
            }
            None => {
                debug!("No custom handler for toolbar format {}", format);
                false
            }
        }
    }

    /// Simulate typing `text` at `index`
    pub fn type_text(&mut self, index: usize, text: &str) {
        let index = index.min(self.length());
        let old = self.contents();
        self.insert_at(index, json!({ "insert": text }));

        let mut change = Vec::new();
        if index > 0 {
            change.push(json!({ "retain": index }));
        }
        change.push(json!({ "insert": text }));
        self.emit(Delta::from_ops(change), old, ChangeSource::User);
    }

    fn emit(&mut self, delta: Delta, old_delta: Delta, source: ChangeSource) {
        let change = TextChange {
            delta,
            old_delta,
            source,
        };
        for listener in self.listeners.iter_mut() {
            listener(change.clone());
        }
    }

    fn insert_at(&mut self, index: usize, op: Value) {
        let mut pending = Some(op);
        let mut out = Vec::with_capacity(self.ops.len() + 2);
        let mut pos = 0;

        for existing in self.ops.drain(..) {
            let len = op_len(&existing);
            if index < pos + len {
                if let Some(new_op) = pending.take() {
                    let offset = index - pos;
                    if offset == 0 {
                        out.push(new_op);
                        out.push(existing);
                    } else {
                        let (head, tail) = split_text_op(&existing, offset);
                        out.push(head);
                        out.push(new_op);
                        out.push(tail);
                    }
                    pos += len;
                    continue;
                }
            }
            out.push(existing);
            pos += len;
        }
        if let Some(new_op) = pending {
            out.push(new_op);
        }
        self.ops = out;
    }
}

impl Editor for MemoryEditor {
    fn contents(&self) -> Delta {
        Delta::from_ops(self.ops.clone())
    }

    fn set_contents(&mut self, delta: Delta) -> Result<()> {
        let old = self.contents();
        let old_len = self.length();
        self.ops = delta.ops().cloned().unwrap_or_default();

        let mut change = Vec::with_capacity(self.ops.len() + 1);
        if old_len > 0 {
            change.push(json!({ "delete": old_len }));
        }
        change.extend(self.ops.iter().cloned());

        let len = self.length();
        if let Some(range) = self.selection.as_mut() {
            range.index = range.index.min(len);
        }
        self.emit(Delta::from_ops(change), old, ChangeSource::Api);
        Ok(())
    }

    fn convert_html(&self, html: &str) -> Result<Delta> {
        Ok(Delta::from_ops(html_to_ops(html)))
    }

    fn selection(&self) -> Option<Range> {
        self.selection
    }

    fn insert_embed(&mut self, index: usize, kind: &str, value: Value) -> Result<()> {
        let index = index.min(self.length());
        let old = self.contents();
        let mut object = Map::new();
        object.insert(kind.to_string(), value);
        let embed = json!({ "insert": object });
        self.insert_at(index, embed.clone());

        let mut change = Vec::new();
        if index > 0 {
            change.push(json!({ "retain": index }));
        }
        change.push(embed);
        self.emit(Delta::from_ops(change), old, ChangeSource::Api);
        Ok(())
    }

    fn set_toolbar_handler(&mut self, format: &str, handler: ToolbarHandler) -> Result<()> {
        self.toolbar_handlers.insert(format.to_string(), handler);
        Ok(())
    }

    fn set_placeholder(&mut self, placeholder: &str) {
        self.root_attributes
            .insert(PLACEHOLDER_ATTRIBUTE.to_string(), placeholder.to_string());
    }

    fn on_text_change(&mut self, listener: TextChangeListener) {
        self.listeners.push(listener);
    }

    fn snapshot(&self) -> Value {
        let mut handlers: Vec<&String> = self.toolbar_handlers.keys().collect();
        handlers.sort();
        json!({
            "theme": self.config.theme,
            "bounds": self.config.bounds,
            "length": self.length(),
            "selection": self.selection,
            "placeholder": self.placeholder(),
            "toolbarHandlers": handlers,
        })
    }
}

/// Builds [`MemoryEditor`]s
#[derive(Debug, Default)]
pub struct MemoryEditorFactory;

impl EditorFactory for MemoryEditorFactory {
    type Editor = MemoryEditor;

    fn create(&mut self, config: &EditorConfig) -> Result<MemoryEditor> {
        debug!("Creating in-memory editor, theme {}", config.theme);
        Ok(MemoryEditor::new(config.clone()))
    }
}

fn op_len(op: &Value) -> usize {
    match op.get("insert") {
        Some(Value::String(text)) => text.chars().count(),
        Some(_) => 1,
        None => 0,
    }
}

fn split_text_op(op: &Value, offset: usize) -> (Value, Value) {
    let text = op["insert"].as_str().unwrap_or_default();
    let head: String = text.chars().take(offset).collect();
    let tail: String = text.chars().skip(offset).collect();

    let with_text = |part: String| {
        let mut split = op.clone();
        split["insert"] = Value::String(part);
        split
    };
    (with_text(head), with_text(tail))
}

#[derive(Default)]
struct Formatting {
    bold: u32,
    italic: u32,
    underline: u32,
}

impl Formatting {
    fn attributes(&self) -> Option<Value> {
        let mut map = Map::new();
        if self.bold > 0 {
            map.insert("bold".into(), Value::Bool(true));
        }
        if self.italic > 0 {
            map.insert("italic".into(), Value::Bool(true));
        }
        if self.underline > 0 {
            map.insert("underline".into(), Value::Bool(true));
        }
        (!map.is_empty()).then_some(Value::Object(map))
    }
}

/// Minimal markup conversion: inline bold/italic/underline, block ends and
/// line breaks become newlines, common entities are decoded. Everything else
/// is dropped to its text.
fn html_to_ops(html: &str) -> Vec<Value> {
    let mut ops = Vec::new();
    let mut format = Formatting::default();
    let mut text = String::new();
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut tag = String::new();
                for t in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                    tag.push(t);
                }
                push_text(&mut ops, &mut text, format.attributes());

                let tag = tag.trim();
                let closing = tag.starts_with('/');
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or_default()
                    .to_ascii_lowercase();

                let depth = |counter: &mut u32| {
                    if closing {
                        *counter = counter.saturating_sub(1);
                    } else {
                        *counter += 1;
                    }
                };
                match name.as_str() {
                    "b" | "strong" => depth(&mut format.bold),
                    "i" | "em" => depth(&mut format.italic),
                    "u" => depth(&mut format.underline),
                    "br" => {
                        text.push('\n');
                        push_text(&mut ops, &mut text, None);
                    }
                    "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" if closing => {
                        text.push('\n');
                        push_text(&mut ops, &mut text, None);
                    }
                    _ => {}
                }
            }
            '&' => {
                let mut entity = String::new();
                let mut terminated = false;
                while let Some(&next) = chars.peek() {
                    if next == ';' {
                        chars.next();
                        terminated = true;
                        break;
                    }
                    if !(next.is_ascii_alphanumeric() || next == '#') || entity.len() >= 8 {
                        break;
                    }
                    entity.push(next);
                    chars.next();
                }
                match decode_entity(&entity).filter(|_| terminated) {
                    Some(decoded) => text.push(decoded),
                    None => {
                        text.push('&');
                        text.push_str(&entity);
                        if terminated {
                            text.push(';');
                        }
                    }
                }
            }
            c => text.push(c),
        }
    }
    push_text(&mut ops, &mut text, format.attributes());
    ops
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Append `text` as an insert, merging with the previous op when the
/// attributes match
fn push_text(ops: &mut Vec<Value>, text: &mut String, attributes: Option<Value>) {
    if text.is_empty() {
        return;
    }
    let chunk = std::mem::take(text);

    if let Some(last) = ops.last_mut() {
        if last.get("attributes") == attributes.as_ref() {
            if let Some(Value::String(existing)) = last.get_mut("insert") {
                existing.push_str(&chunk);
                return;
            }
        }
    }

    let mut op = json!({ "insert": chunk });
    if let Some(attributes) = attributes {
        op["attributes"] = attributes;
    }
    ops.push(op);
}
