//! By-name method dispatch on a command found in a catalog

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::catalog::Catalog;
use crate::catalog_factory::CatalogFactory;
use crate::command::{Command, CommandRef, Filter};
use crate::context::Context;
use crate::errors::{ChainError, Result};
use crate::generic::dispatch::{ArgumentBuilder, MethodSelector};
use crate::generic::lookup::{CatalogSource, LookupCommand};
use crate::method::{coerce_result, Method};

/// A resolved method, remembered together with the command it came from
struct CachedMethod {
    target: Weak<dyn Command>,
    method: Method,
}

/// Looks up a command by name and invokes one of its methods by name
///
/// Configuration rules, checked on every call:
/// - exactly one of `with_name` / `with_name_key`;
/// - exactly one of `with_method` / `with_method_key`.
///
/// Violations fail with `IllegalState`. The target must expose a
/// [`MethodTable`](crate::method::MethodTable) containing the method with the
/// signature declared by the argument builder, otherwise the call fails with
/// `NoSuchMethod`. A method returning anything but a JSON boolean counts as
/// `false`.
///
/// Resolved methods are cached per method name. An entry is reused only
/// while the lookup keeps resolving to the same command instance.
///
/// During unwind it behaves like a [`LookupCommand`]: `postprocess` is
/// forwarded to the target when the target is a filter, and ignored
/// otherwise.
pub struct DispatchLookupCommand {
    lookup: LookupCommand,
    selector: MethodSelector,
    arguments: ArgumentBuilder,
    cache: RwLock<HashMap<String, CachedMethod>>,
}

impl DispatchLookupCommand {
    /// Dispatch into the default catalog of the global factory
    pub fn new() -> Self {
        Self::from_lookup(LookupCommand::new())
    }

    pub fn from_factory(factory: Arc<CatalogFactory>) -> Self {
        Self::from_lookup(LookupCommand::from_factory(factory))
    }

    pub fn from_catalog(catalog: Arc<Catalog>) -> Self {
        Self::from_lookup(LookupCommand::from_catalog(catalog))
    }

    fn from_lookup(lookup: LookupCommand) -> Self {
        Self {
            lookup,
            selector: MethodSelector::default(),
            arguments: ArgumentBuilder::default(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_catalog_name(mut self, catalog_name: impl Into<String>) -> Self {
        self.lookup = self.lookup.with_catalog_name(catalog_name);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.lookup = self.lookup.with_name(name);
        self
    }

    pub fn with_name_key(mut self, name_key: impl Into<String>) -> Self {
        self.lookup = self.lookup.with_name_key(name_key);
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.selector.method = Some(method.into());
        self
    }

    pub fn with_method_key(mut self, method_key: impl Into<String>) -> Self {
        self.selector.method_key = Some(method_key.into());
        self
    }

    /// Return `false` instead of failing when the command is missing
    pub fn optional(mut self, optional: bool) -> Self {
        self.lookup = self.lookup.optional(optional);
        self
    }

    pub fn with_arguments(mut self, arguments: ArgumentBuilder) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn source(&self) -> &CatalogSource {
        self.lookup.source()
    }

    /// Number of method names currently cached
    pub fn cached_methods(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn validate(&self) -> Result<()> {
        if !self.lookup.has_single_name_source() {
            return Err(ChainError::illegal_state(
                "Exactly one of 'name' and 'name_key' must be defined",
            ));
        }
        self.selector.validate()
    }

    fn resolve_method(&self, target: &CommandRef, name: &str) -> Result<Method> {
        let handle = Arc::downgrade(target);
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(name) {
                if Weak::ptr_eq(&cached.target, &handle) {
                    return Ok(cached.method.clone());
                }
            }
        }

        let table = target.methods().ok_or_else(|| ChainError::NoSuchMethod {
            method: name.to_string(),
            reason: "target command exposes no methods".to_string(),
        })?;
        let method = table.resolve(name, self.arguments.signature())?.clone();

        // Two threads may both get here; the later insert wins, which is
        // equivalent since both resolved the same target.
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                name.to_string(),
                CachedMethod {
                    target: handle,
                    method: method.clone(),
                },
            );
        Ok(method)
    }
}

impl Default for DispatchLookupCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for DispatchLookupCommand {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        self.validate()?;

        let Some(target) = self.lookup.lookup(&*context)? else {
            return Ok(false);
        };
        let name = self.selector.method_name(&*context)?;
        let method = self.resolve_method(&target, &name)?;

        tracing::debug!(
            component = module_path!(),
            op = "dispatch_lookup",
            method = %name,
            "invoking method"
        );
        let args = self.arguments.build(&*context);
        let value = method.invoke(context, &args)?;
        Ok(coerce_result(&value))
    }

    fn as_filter(&self) -> Option<&dyn Filter> {
        Some(self)
    }
}

impl Filter for DispatchLookupCommand {
    fn postprocess(&self, context: &mut dyn Context, error: Option<&ChainError>) -> Result<bool> {
        self.lookup.postprocess(context, error)
    }
}

impl std::fmt::Debug for DispatchLookupCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchLookupCommand")
            .field("lookup", &self.lookup)
            .field("selector", &self.selector)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}
