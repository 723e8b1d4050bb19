//! Request-scoped state passed through every command
//!
//! [`Context`] is the contract commands program against. Host adapters
//! implement it over their native attribute stores; [`ContextBase`] is the
//! stock in-memory implementation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Result;

/// Ordered key-value store shared by all commands of one execution
///
/// Keys are unique. Iteration order is insertion order for the stock
/// implementation; adapters should preserve whatever order their backing
/// store has.
pub trait Context: Send {
    /// Value stored under `key`, if any
    fn get(&self, key: &str) -> Option<&Value>;

    /// Store `value` under `key`, returning the value it replaced
    fn put(&mut self, key: String, value: Value) -> Option<Value>;

    /// Remove `key`, returning its value
    fn remove(&mut self, key: &str) -> Option<Value>;

    /// Snapshot of the keys currently stored, in iteration order
    fn keys(&self) -> Vec<String>;

    /// Remove every entry
    fn clear(&mut self);

    /// Number of entries
    fn len(&self) -> usize;

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// String value stored under `key`; `None` when absent or not a string
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// In-memory [`Context`] backed by an insertion-ordered JSON object
///
/// Serializes as a plain JSON object, so a context can be captured or seeded
/// from JSON by the host.
///
/// # Example
///
/// ```
/// use relay_core::context::{Context, ContextBase};
/// use serde_json::json;
///
/// let mut ctx = ContextBase::new();
/// assert_eq!(ctx.put("user".to_string(), json!("ada")), None);
/// assert_eq!(ctx.put("user".to_string(), json!("grace")), Some(json!("ada")));
/// assert_eq!(ctx.get_str("user"), Some("grace"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextBase {
    entries: Map<String, Value>,
}

impl ContextBase {
    /// Create an empty context
    pub fn new() -> Self {
        Self {
            entries: Map::new(),
        }
    }

    /// Create a context seeded from an existing JSON object
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Builder-style insert used when seeding a context
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Deserialize the value stored under `key` into `T`
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the stored value does not have the shape of `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.entries.get(key) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` and store it under `key`
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if `value` cannot be represented as JSON.
    pub fn put_as<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<Option<Value>> {
        let value = serde_json::to_value(value)?;
        Ok(self.entries.insert(key.into(), value))
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Consume the context, returning the backing object
    pub fn into_map(self) -> Map<String, Value> {
        self.entries
    }
}

impl Context for ContextBase {
    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn put(&mut self, key: String, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        // shift_remove keeps the order of the remaining keys
        self.entries.shift_remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(String, Value)> for ContextBase {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
