//! Document content types
//!
//! A [`Delta`] is opaque to the bridge: it is carried between the host and the
//! editor engine without interpretation. The only structure assumed is Quill's
//! `{"ops": [...]}` shape, which the bridge needs to tell an empty conversion
//! result from a real one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document content or a content change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(pub Value);

impl Delta {
    /// Delta with no operations
    pub fn empty() -> Self {
        Self::from_ops(Vec::new())
    }

    /// Wrap a list of operations as `{"ops": [...]}`
    pub fn from_ops(ops: Vec<Value>) -> Self {
        Delta(serde_json::json!({ "ops": ops }))
    }

    /// Operations of this delta.
    ///
    /// Accepts both the object form and a bare operation array, since the
    /// editor engine accepts either for `setContents`.
    pub fn ops(&self) -> Option<&Vec<Value>> {
        match &self.0 {
            Value::Array(ops) => Some(ops),
            Value::Object(map) => map.get("ops").and_then(Value::as_array),
            _ => None,
        }
    }

    /// True when the delta carries no operations
    pub fn is_empty(&self) -> bool {
        self.ops().is_none_or(|ops| ops.is_empty())
    }

    /// Borrow the raw JSON
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl Default for Delta {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Delta {
    fn from(value: Value) -> Self {
        Delta(value)
    }
}

/// Current selection in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub index: usize,
    pub length: usize,
}

impl Range {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// Collapsed cursor at `index`
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }
}

/// Origin of a content change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    /// Programmatic change
    Api,
    /// Change made by the person typing
    User,
    /// Programmatic change that should not be echoed
    Silent,
}
