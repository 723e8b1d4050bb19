//! Remove a context key

use crate::command::{Command, CONTINUE_PROCESSING};
use crate::context::Context;
use crate::errors::Result;

/// Removes `from_key` from the context and lets the chain continue
#[derive(Debug, Clone, Default)]
pub struct RemoveCommand {
    from_key: Option<String>,
}

impl RemoveCommand {
    pub fn new(from_key: impl Into<String>) -> Self {
        Self {
            from_key: Some(from_key.into()),
        }
    }
}

impl Command for RemoveCommand {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        if let Some(key) = &self.from_key {
            context.remove(key);
        }
        Ok(CONTINUE_PROCESSING)
    }
}
