use std::sync::Arc;

use relay_core::command::{Command, CommandRef, Filter};
use relay_core::context::Context;
use relay_core::errors::{ChainError, Result};
use serde_json::json;

/// Context key every fixture appends its id to
pub const LOG_KEY: &str = "log";

/// Error raised by [`Failing`] and [`FailingFilter`]
#[derive(Debug, thiserror::Error)]
#[error("fixture {id} failed")]
pub struct FixtureError {
    pub id: String,
}

/// Append `id` to the `/`-separated log in the context
pub fn append_log(context: &mut dyn Context, id: &str) {
    let entry = match context.get_str(LOG_KEY) {
        Some(log) if !log.is_empty() => format!("{}/{}", log, id),
        _ => id.to_string(),
    };
    context.put(LOG_KEY.to_string(), json!(entry));
}

/// Current log contents
#[allow(dead_code)]
pub fn log_of(context: &dyn Context) -> String {
    context.get_str(LOG_KEY).unwrap_or_default().to_string()
}

/// Logs its id and lets the chain continue
pub struct Delegating {
    pub id: String,
}

impl Command for Delegating {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        append_log(context, &self.id);
        Ok(false)
    }
}

/// Logs its id and stops the chain
pub struct NonDelegating {
    pub id: String,
}

impl Command for NonDelegating {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        append_log(context, &self.id);
        Ok(true)
    }
}

/// Logs its id and fails with a [`FixtureError`]
pub struct Failing {
    pub id: String,
}

impl Command for Failing {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        append_log(context, &self.id);
        Err(ChainError::command(FixtureError {
            id: self.id.clone(),
        }))
    }
}

/// Filter that logs its id on execute and on postprocess
///
/// `stops` controls the execute result, `handles` the postprocess result.
pub struct LoggingFilter {
    pub id: String,
    pub stops: bool,
    pub handles: bool,
}

impl Command for LoggingFilter {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        append_log(context, &self.id);
        Ok(self.stops)
    }

    fn as_filter(&self) -> Option<&dyn Filter> {
        Some(self)
    }
}

impl Filter for LoggingFilter {
    fn postprocess(&self, context: &mut dyn Context, _error: Option<&ChainError>) -> Result<bool> {
        append_log(context, &self.id);
        Ok(self.handles)
    }
}

/// Filter whose postprocess logs its id and then fails
pub struct FailingFilter {
    pub id: String,
}

impl Command for FailingFilter {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        append_log(context, &self.id);
        Ok(false)
    }

    fn as_filter(&self) -> Option<&dyn Filter> {
        Some(self)
    }
}

impl Filter for FailingFilter {
    fn postprocess(&self, context: &mut dyn Context, _error: Option<&ChainError>) -> Result<bool> {
        append_log(context, &self.id);
        Err(ChainError::command(FixtureError {
            id: format!("{}-postprocess", self.id),
        }))
    }
}

#[allow(dead_code)]
pub fn delegating(id: &str) -> CommandRef {
    Arc::new(Delegating { id: id.to_string() })
}

#[allow(dead_code)]
pub fn non_delegating(id: &str) -> CommandRef {
    Arc::new(NonDelegating { id: id.to_string() })
}

#[allow(dead_code)]
pub fn failing(id: &str) -> CommandRef {
    Arc::new(Failing { id: id.to_string() })
}

/// Filter that continues on execute and does not handle errors
#[allow(dead_code)]
pub fn delegating_filter(id: &str) -> CommandRef {
    Arc::new(LoggingFilter {
        id: id.to_string(),
        stops: false,
        handles: false,
    })
}

/// Filter that continues on execute and handles any error
#[allow(dead_code)]
pub fn handling_filter(id: &str) -> CommandRef {
    Arc::new(LoggingFilter {
        id: id.to_string(),
        stops: false,
        handles: true,
    })
}

/// Filter that stops the chain on execute
#[allow(dead_code)]
pub fn non_delegating_filter(id: &str) -> CommandRef {
    Arc::new(LoggingFilter {
        id: id.to_string(),
        stops: true,
        handles: false,
    })
}

#[allow(dead_code)]
pub fn failing_filter(id: &str) -> CommandRef {
    Arc::new(FailingFilter { id: id.to_string() })
}
