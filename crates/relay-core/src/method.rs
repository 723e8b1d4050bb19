//! Named, typed methods for by-name dispatch
//!
//! A command that can be dispatched by method name builds a [`MethodTable`]
//! when it is constructed. Each entry pairs a closure with the
//! [`Signature`] it declares; a dispatcher resolves a method by name and
//! signature and then calls it with the context plus the argument values its
//! argument builder produced.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::errors::{ChainError, Result};

/// Kind of one declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// The live context of the current execution
    Context,
    /// A value produced by the dispatcher's argument builder
    Value,
}

/// Declared parameter list of a dispatchable method
///
/// The default signature is a single [`ParamType::Context`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    params: Vec<ParamType>,
}

impl Signature {
    pub fn new(params: Vec<ParamType>) -> Self {
        Self { params }
    }

    /// `(context)`
    pub fn context_only() -> Self {
        Self::new(vec![ParamType::Context])
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Number of [`ParamType::Value`] parameters
    pub fn value_arity(&self) -> usize {
        self.params
            .iter()
            .filter(|p| **p == ParamType::Value)
            .count()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::context_only()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .params
            .iter()
            .map(|p| match p {
                ParamType::Context => "context",
                ParamType::Value => "value",
            })
            .collect();
        write!(f, "({})", names.join(", "))
    }
}

/// Callable body of a dispatchable method
pub type MethodFn = dyn Fn(&mut dyn Context, &[Value]) -> Result<Value> + Send + Sync;

/// A resolved method handle
#[derive(Clone)]
pub struct Method {
    signature: Signature,
    func: Arc<MethodFn>,
}

impl Method {
    pub fn new<F>(signature: Signature, func: F) -> Self
    where
        F: Fn(&mut dyn Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            signature,
            func: Arc::new(func),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Call the method
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `args` does not match the declared value arity;
    /// otherwise whatever the method body returns.
    pub fn invoke(&self, context: &mut dyn Context, args: &[Value]) -> Result<Value> {
        let expected = self.signature.value_arity();
        if args.len() != expected {
            return Err(ChainError::invalid_argument(format!(
                "method declared {} value argument(s) but {} were supplied",
                expected,
                args.len()
            )));
        }
        (self.func)(context, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Interpret a method's return value as a chain signal
///
/// Only a JSON boolean counts; anything else (null, numbers, strings) is
/// `false`.
pub fn coerce_result(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

/// Method name → [`Method`] registry owned by a dispatchable command
#[derive(Clone, Default)]
pub struct MethodTable {
    methods: HashMap<String, Method>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, method: Method) {
        self.methods.insert(name.into(), method);
    }

    /// Builder-style registration with an explicit signature
    pub fn with<F>(mut self, name: impl Into<String>, signature: Signature, func: F) -> Self
    where
        F: Fn(&mut dyn Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(name, Method::new(signature, func));
        self
    }

    /// Builder-style registration of a `(context) -> bool` method
    pub fn with_context_method<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut dyn Context) -> Result<bool> + Send + Sync + 'static,
    {
        self.with(name, Signature::context_only(), move |ctx, _args| {
            func(ctx).map(Value::Bool)
        })
    }

    /// Find `name` declared with exactly `signature`
    ///
    /// # Errors
    ///
    /// `NoSuchMethod` if no method has that name, or if it declares a
    /// different signature.
    pub fn resolve(&self, name: &str, signature: &Signature) -> Result<&Method> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| ChainError::NoSuchMethod {
                method: name.to_string(),
                reason: "no method registered under this name".to_string(),
            })?;

        if method.signature() != signature {
            return Err(ChainError::NoSuchMethod {
                method: name.to_string(),
                reason: format!(
                    "declared signature {} does not match requested {}",
                    method.signature(),
                    signature
                ),
            });
        }

        Ok(method)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.names())
            .finish()
    }
}
