//! The unit contract: [`Command`] and its [`Filter`] refinement

use std::sync::Arc;

use crate::context::Context;
use crate::errors::{ChainError, Result};
use crate::method::MethodTable;

/// Signal returned by [`Command::execute`]: stop the chain
pub const PROCESSING_COMPLETE: bool = true;

/// Signal returned by [`Command::execute`]: hand over to the next command
pub const CONTINUE_PROCESSING: bool = false;

/// Shared handle to a registered command
pub type CommandRef = Arc<dyn Command>;

/// A single unit of work executed against a [`Context`]
///
/// `Ok(true)` means processing is complete and an enclosing chain must stop;
/// `Ok(false)` lets the chain continue. Any error aborts the enclosing chain
/// and is offered to the filters that already ran.
///
/// Commands are shared between catalogs, chains and threads, so they must
/// not rely on per-execution mutable state of their own; everything
/// request-specific belongs in the context.
pub trait Command: Send + Sync {
    /// Run this command
    ///
    /// # Errors
    ///
    /// Whatever the command reports; chains propagate it unchanged.
    fn execute(&self, context: &mut dyn Context) -> Result<bool>;

    /// Filter capability of this command
    ///
    /// Implementors of [`Filter`] return `Some(self)`. Chains query this once
    /// when the command is appended.
    fn as_filter(&self) -> Option<&dyn Filter> {
        None
    }

    /// Methods this command exposes for by-name dispatch
    fn methods(&self) -> Option<&MethodTable> {
        None
    }
}

/// A [`Command`] that also takes part in the unwind of an enclosing chain
///
/// After a chain stops, `postprocess` is called on every filter that was
/// executed, innermost first. `error` is the error that stopped the chain,
/// if any. Returning `Ok(true)` marks that error as handled so the chain
/// does not propagate it. Errors returned from `postprocess` are logged and
/// discarded by the chain.
pub trait Filter: Command {
    /// Observe (and possibly handle) the outcome of the chain
    ///
    /// # Errors
    ///
    /// Any failure of the cleanup itself; chains log and ignore it.
    fn postprocess(&self, context: &mut dyn Context, error: Option<&ChainError>) -> Result<bool>;
}

impl<C: Command + ?Sized> Command for Arc<C> {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        (**self).execute(context)
    }

    fn as_filter(&self) -> Option<&dyn Filter> {
        (**self).as_filter()
    }

    fn methods(&self) -> Option<&MethodTable> {
        (**self).methods()
    }
}

/// Capability summary of a shared command
///
/// Lets `CommandRef` and the results carrying it take part in `{:?}`.
impl std::fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("Command");
        out.field("filter", &self.as_filter().is_some());
        if let Some(methods) = self.methods() {
            out.field("methods", &methods.names());
        }
        out.finish()
    }
}

/// Command backed by a closure
///
/// Handy for wiring small steps without declaring a type.
///
/// # Example
///
/// ```
/// use relay_core::command::{Command, FnCommand, CONTINUE_PROCESSING};
/// use relay_core::context::{Context, ContextBase};
/// use serde_json::json;
///
/// let stamp = FnCommand::new(|ctx: &mut dyn Context| {
///     ctx.put("stamped".to_string(), json!(true));
///     Ok(CONTINUE_PROCESSING)
/// });
/// let mut ctx = ContextBase::new();
/// assert!(!stamp.execute(&mut ctx).unwrap());
/// assert_eq!(ctx.get("stamped"), Some(&json!(true)));
/// ```
pub struct FnCommand<F> {
    func: F,
}

impl<F> FnCommand<F>
where
    F: Fn(&mut dyn Context) -> Result<bool> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Command for FnCommand<F>
where
    F: Fn(&mut dyn Context) -> Result<bool> + Send + Sync,
{
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        (self.func)(context)
    }
}

impl<F> std::fmt::Debug for FnCommand<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnCommand")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBase;

    struct Cleanup;

    impl Command for Cleanup {
        fn execute(&self, _context: &mut dyn Context) -> Result<bool> {
            Ok(CONTINUE_PROCESSING)
        }

        fn as_filter(&self) -> Option<&dyn Filter> {
            Some(self)
        }
    }

    impl Filter for Cleanup {
        fn postprocess(&self, _context: &mut dyn Context, error: Option<&ChainError>) -> Result<bool> {
            Ok(error.is_some())
        }
    }

    #[test]
    fn test_plain_command_has_no_capabilities() {
        let cmd = FnCommand::new(|_: &mut dyn Context| Ok(PROCESSING_COMPLETE));
        assert!(cmd.as_filter().is_none());
        assert!(cmd.methods().is_none());
        assert!(cmd.execute(&mut ContextBase::new()).unwrap());
    }

    #[test]
    fn test_filter_capability_survives_arc() {
        let shared: CommandRef = Arc::new(Cleanup);
        let filter = shared.as_filter().expect("filter capability");
        let err = ChainError::failed("boom");
        assert!(filter
            .postprocess(&mut ContextBase::new(), Some(&err))
            .unwrap());
    }

    #[test]
    fn test_shared_command_debug_lists_capabilities() {
        let cleanup: CommandRef = Arc::new(Cleanup);
        assert_eq!(format!("{:?}", cleanup), "Command { filter: true }");

        let methods = MethodTable::new().with_context_method("close", |_| Ok(true));
        let dispatch: CommandRef = Arc::new(crate::generic::DispatchCommand::new(methods));
        assert_eq!(
            format!("{:?}", dispatch),
            "Command { filter: false, methods: [\"close\"] }"
        );

        // Lookup results can now be unwrapped on either side.
        let found: Result<Option<CommandRef>> = Ok(Some(cleanup));
        assert!(found.unwrap().is_some());
    }
}
