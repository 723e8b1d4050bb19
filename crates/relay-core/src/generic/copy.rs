//! Copy a value into a context key

use serde_json::Value;

use crate::command::{Command, CONTINUE_PROCESSING};
use crate::context::Context;
use crate::errors::Result;

/// Copies a context value (or a configured literal) to another key
///
/// The value is the configured literal when one is set, otherwise the value
/// under `from_key`. When there is no value the destination key is removed.
/// Always lets the chain continue.
#[derive(Debug, Clone, Default)]
pub struct CopyCommand {
    from_key: Option<String>,
    to_key: Option<String>,
    value: Option<Value>,
}

impl CopyCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_key(mut self, key: impl Into<String>) -> Self {
        self.from_key = Some(key.into());
        self
    }

    pub fn to_key(mut self, key: impl Into<String>) -> Self {
        self.to_key = Some(key.into());
        self
    }

    /// Literal value to copy instead of reading `from_key`
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl Command for CopyCommand {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        let Some(to_key) = &self.to_key else {
            return Ok(CONTINUE_PROCESSING);
        };

        let value = match (&self.value, &self.from_key) {
            (Some(value), _) => Some(value.clone()),
            (None, Some(from_key)) => context.get(from_key).cloned(),
            (None, None) => None,
        };

        match value {
            Some(value) => {
                context.put(to_key.clone(), value);
            }
            None => {
                context.remove(to_key);
            }
        }
        Ok(CONTINUE_PROCESSING)
    }
}
