//! Message bundle model.
//!
//! A bundle is a nested mapping of namespace → key → string, one per
//! locale. Bundles are immutable after load; the cache replaces them
//! wholesale, never patches them in place.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Maximum nesting depth honored when flattening keys. Branches deeper than
/// this are truncated and reported, so pathological bundles always terminate.
pub const MAX_FLATTEN_DEPTH: usize = 16;

/// One node in a message bundle: either a translated string or a namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageTree {
    Leaf(String),
    Branch(BTreeMap<String, MessageTree>),
}

/// A complete message bundle for one locale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Messages {
    root: BTreeMap<String, MessageTree>,
}

/// Result of flattening a bundle's key space.
#[derive(Debug, Clone, Default)]
pub struct FlattenedKeys {
    /// Dotted key paths of every leaf (e.g. "common.nav.home").
    pub keys: BTreeSet<String>,
    /// Dotted paths of branches cut off at [`MAX_FLATTEN_DEPTH`].
    pub truncated: Vec<String>,
}

impl Messages {
    /// The empty bundle, used as the rendering fallback when loading fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode a bundle from a raw JSON value.
    ///
    /// The value must be an object whose leaves are strings; anything else
    /// (a bare string, an array, numeric leaves) is malformed.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom(format!(
                "bundle root must be an object, got {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of translated strings in the bundle.
    pub fn key_count(&self) -> usize {
        self.flatten_keys().keys.len()
    }

    /// Collect every dotted leaf path, depth-capped.
    pub fn flatten_keys(&self) -> FlattenedKeys {
        let mut flattened = FlattenedKeys::default();
        for (name, node) in &self.root {
            flatten_into(node, name, 1, &mut flattened);
        }
        flattened
    }

    /// Look up a translated string by dotted path.
    ///
    /// A missing or non-leaf path yields the key itself, so broken
    /// translations degrade to visible key text instead of blank output.
    pub fn lookup<'a>(&'a self, key: &'a str) -> &'a str {
        let mut segments = key.split('.');
        let first = match segments.next() {
            Some(s) => s,
            None => return key,
        };
        let mut node = match self.root.get(first) {
            Some(n) => n,
            None => return key,
        };
        for segment in segments {
            node = match node {
                MessageTree::Branch(children) => match children.get(segment) {
                    Some(n) => n,
                    None => return key,
                },
                MessageTree::Leaf(_) => return key,
            };
        }
        match node {
            MessageTree::Leaf(text) => text,
            MessageTree::Branch(_) => key,
        }
    }
}

fn flatten_into(node: &MessageTree, path: &str, depth: usize, out: &mut FlattenedKeys) {
    match node {
        MessageTree::Leaf(_) => {
            out.keys.insert(path.to_string());
        }
        MessageTree::Branch(children) => {
            if depth >= MAX_FLATTEN_DEPTH {
                out.truncated.push(path.to_string());
                return;
            }
            for (name, child) in children {
                flatten_into(child, &format!("{}.{}", path, name), depth + 1, out);
            }
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
