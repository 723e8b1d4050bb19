//! By-name method dispatch on a command's own method table

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::command::Command;
use crate::context::Context;
use crate::errors::{ChainError, Result};
use crate::method::{coerce_result, MethodTable, Signature};

type BuildFn = dyn Fn(&dyn Context) -> Vec<Value> + Send + Sync;

/// Calling convention used by the dispatch commands
///
/// Declares the signature a target method must have and produces the
/// value arguments for each call. The default is the single-context
/// signature with no value arguments.
#[derive(Clone)]
pub struct ArgumentBuilder {
    signature: Signature,
    build: Arc<BuildFn>,
}

impl ArgumentBuilder {
    pub fn new<F>(signature: Signature, build: F) -> Self
    where
        F: Fn(&dyn Context) -> Vec<Value> + Send + Sync + 'static,
    {
        Self {
            signature,
            build: Arc::new(build),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Value arguments for one call
    pub fn build(&self, context: &dyn Context) -> Vec<Value> {
        (self.build)(context)
    }
}

impl Default for ArgumentBuilder {
    fn default() -> Self {
        Self::new(Signature::context_only(), |_| Vec::new())
    }
}

impl fmt::Debug for ArgumentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentBuilder")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Method name source shared by the dispatch commands
#[derive(Debug, Clone, Default)]
pub(crate) struct MethodSelector {
    pub(crate) method: Option<String>,
    pub(crate) method_key: Option<String>,
}

impl MethodSelector {
    /// Ensure exactly one of `method` / `method_key` is configured
    pub(crate) fn validate(&self) -> Result<()> {
        match (&self.method, &self.method_key) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (None, None) => Err(ChainError::illegal_state(
                "Neither 'method' nor 'method_key' is defined",
            )),
            (Some(_), Some(_)) => Err(ChainError::illegal_state(
                "Both 'method' and 'method_key' are defined",
            )),
        }
    }

    /// Method name for this execution
    pub(crate) fn method_name(&self, context: &dyn Context) -> Result<String> {
        if let Some(method) = &self.method {
            return Ok(method.clone());
        }
        let key = self.method_key.as_deref().unwrap_or_default();
        context.get_str(key).map(str::to_string).ok_or_else(|| {
            ChainError::invalid_argument(format!("No method name under context key '{}'", key))
        })
    }
}

/// Command that executes one of its own methods, chosen by name
///
/// The method name is fixed (`with_method`) or read from the context
/// (`with_method_key`); exactly one must be configured.
///
/// # Example
///
/// ```
/// use relay_core::command::Command;
/// use relay_core::context::{Context, ContextBase};
/// use relay_core::generic::DispatchCommand;
/// use relay_core::method::MethodTable;
/// use serde_json::json;
///
/// let methods = MethodTable::new()
///     .with_context_method("open", |ctx| {
///         ctx.put("state".to_string(), json!("open"));
///         Ok(false)
///     })
///     .with_context_method("close", |ctx| {
///         ctx.put("state".to_string(), json!("closed"));
///         Ok(true)
///     });
///
/// let dispatch = DispatchCommand::new(methods).with_method_key("action");
/// let mut ctx = ContextBase::new().with("action", "close");
/// assert!(dispatch.execute(&mut ctx).unwrap());
/// assert_eq!(ctx.get_str("state"), Some("closed"));
/// ```
#[derive(Debug, Clone)]
pub struct DispatchCommand {
    methods: MethodTable,
    selector: MethodSelector,
    arguments: ArgumentBuilder,
}

impl DispatchCommand {
    pub fn new(methods: MethodTable) -> Self {
        Self {
            methods,
            selector: MethodSelector::default(),
            arguments: ArgumentBuilder::default(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.selector.method = Some(method.into());
        self
    }

    /// Read the method name from this context key
    pub fn with_method_key(mut self, method_key: impl Into<String>) -> Self {
        self.selector.method_key = Some(method_key.into());
        self
    }

    pub fn with_arguments(mut self, arguments: ArgumentBuilder) -> Self {
        self.arguments = arguments;
        self
    }
}

impl Command for DispatchCommand {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        self.selector.validate()?;
        let name = self.selector.method_name(&*context)?;
        let method = self.methods.resolve(&name, self.arguments.signature())?;
        let args = self.arguments.build(&*context);
        let value = method.invoke(context, &args)?;
        Ok(coerce_result(&value))
    }

    fn methods(&self) -> Option<&MethodTable> {
        Some(&self.methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBase;
    use crate::method::ParamType;
    use serde_json::json;

    fn methods() -> MethodTable {
        MethodTable::new()
            .with_context_method("noop", |_| Ok(false))
            .with("label", Signature::context_only(), |_, _| Ok(json!("not a bool")))
    }

    #[test]
    fn test_requires_exactly_one_method_source() {
        let neither = DispatchCommand::new(methods());
        assert!(matches!(
            neither.execute(&mut ContextBase::new()),
            Err(ChainError::IllegalState { .. })
        ));

        let both = DispatchCommand::new(methods())
            .with_method("noop")
            .with_method_key("m");
        assert!(matches!(
            both.execute(&mut ContextBase::new()),
            Err(ChainError::IllegalState { .. })
        ));
    }

    #[test]
    fn test_non_boolean_result_is_false() {
        let dispatch = DispatchCommand::new(methods()).with_method("label");
        assert!(!dispatch.execute(&mut ContextBase::new()).unwrap());
    }

    #[test]
    fn test_unknown_method() {
        let dispatch = DispatchCommand::new(methods()).with_method("missing");
        assert!(matches!(
            dispatch.execute(&mut ContextBase::new()),
            Err(ChainError::NoSuchMethod { .. })
        ));
    }

    #[test]
    fn test_custom_arguments() {
        let sig = Signature::new(vec![ParamType::Context, ParamType::Value]);
        let methods = MethodTable::new().with("echo", sig.clone(), |ctx, args| {
            ctx.put("echo".to_string(), args[0].clone());
            Ok(json!(true))
        });
        let dispatch = DispatchCommand::new(methods)
            .with_method("echo")
            .with_arguments(ArgumentBuilder::new(sig, |ctx| {
                vec![ctx.get("input").cloned().unwrap_or(Value::Null)]
            }));

        let mut ctx = ContextBase::new().with("input", 42);
        assert!(dispatch.execute(&mut ctx).unwrap());
        assert_eq!(ctx.get("echo"), Some(&json!(42)));
    }
}
