//! Configuration tree
//!
//! A partial or merged configuration document. Keys are case-insensitive: every
//! tree is normalized to lower-case keys when it is built, and null values are
//! dropped so that they count as absent.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::error::{ConfigError, Result};

/// Normalized configuration document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Map<String, Value>,
}

impl ConfigTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a parsed document
    ///
    /// A document whose top level is not a mapping yields an empty tree.
    pub fn from_value(value: Value) -> Self {
        match normalize(value) {
            Some(Value::Object(root)) => Self { root },
            _ => Self::default(),
        }
    }

    /// Whether the tree holds no keys at all
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Merge a higher-precedence tree into this one
    ///
    /// Keys present in `other` win; keys absent from `other` are kept.
    /// Mappings are merged recursively, any other value is replaced whole.
    pub fn merge(&mut self, other: ConfigTree) {
        merge_maps(&mut self.root, other.root);
    }

    /// Look up a dotted key such as `authgate.jwt.maxAge`
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.').map(str::to_lowercase);
        let first = segments.next()?;
        let mut current = self.root.get(&first)?;
        for segment in segments {
            current = current.as_object()?.get(&segment)?;
        }
        Some(current)
    }

    /// Whether any source explicitly set the dotted key
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a dotted key, creating intermediate mappings as needed
    pub fn set(&mut self, key: &str, value: Value) {
        let Some(value) = normalize(value) else {
            return;
        };

        let segments: Vec<String> = key.split('.').map(str::to_lowercase).collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in parents {
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        current.insert(last.clone(), value);
    }

    /// Deserialize the sub-tree at `key`
    ///
    /// A missing sub-tree yields `T::default()`.
    pub fn unmarshal_key<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::Unmarshal(key.to_string(), e.to_string())),
            None => Ok(T::default()),
        }
    }

    /// Borrow the whole tree as a JSON value
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }
}

fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k.to_lowercase(), v)))
                .collect(),
        )),
        Value::Array(items) => Some(Value::Array(items.into_iter().filter_map(normalize).collect())),
        other => Some(other),
    }
}

fn merge_maps(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge_maps(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
