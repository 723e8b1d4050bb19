//! Delegation to a command resolved by name at execution time

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::catalog_factory::{CatalogFactory, CommandId};
use crate::command::{Command, CommandRef, Filter};
use crate::context::Context;
use crate::errors::{ChainError, Result};

/// Where a lookup command finds its catalog
#[derive(Clone)]
pub enum CatalogSource {
    /// A specific catalog
    Catalog(Arc<Catalog>),
    /// A factory's default catalog, or one of its named catalogs
    Factory {
        factory: Arc<CatalogFactory>,
        catalog_name: Option<String>,
    },
}

impl CatalogSource {
    /// Resolve the catalog
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the factory has no such catalog.
    pub fn resolve(&self) -> Result<Arc<Catalog>> {
        match self {
            CatalogSource::Catalog(catalog) => Ok(Arc::clone(catalog)),
            CatalogSource::Factory {
                factory,
                catalog_name: None,
            } => factory
                .catalog()
                .ok_or_else(|| ChainError::invalid_argument("Cannot find default catalog")),
            CatalogSource::Factory {
                factory,
                catalog_name: Some(name),
            } => factory.get_catalog(name).ok_or_else(|| {
                ChainError::invalid_argument(format!("Cannot find catalog '{}'", name))
            }),
        }
    }

    fn describe(&self) -> String {
        match self {
            CatalogSource::Catalog(_) => "configured catalog".to_string(),
            CatalogSource::Factory {
                catalog_name: None, ..
            } => "default catalog".to_string(),
            CatalogSource::Factory {
                catalog_name: Some(name),
                ..
            } => format!("catalog '{}'", name),
        }
    }
}

impl std::fmt::Debug for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Looks up a command by name and delegates `execute` and `postprocess` to it
///
/// The command name is either configured directly (`with_name`) or read from
/// the context (`with_name_key`). When the source is a factory without a
/// catalog name, a qualified `catalog:command` name is resolved through the
/// factory's identifier grammar.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use relay_core::catalog::Catalog;
/// use relay_core::command::{Command, FnCommand};
/// use relay_core::context::{Context, ContextBase};
/// use relay_core::generic::LookupCommand;
///
/// let catalog = Arc::new(Catalog::new());
/// catalog.add("audit", FnCommand::new(|_: &mut dyn Context| Ok(true)));
///
/// let lookup = LookupCommand::from_catalog(Arc::clone(&catalog)).with_name("audit");
/// assert!(lookup.execute(&mut ContextBase::new()).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct LookupCommand {
    source: CatalogSource,
    name: Option<String>,
    name_key: Option<String>,
    optional: bool,
    ignore_execute_result: bool,
    ignore_postprocess_result: bool,
}

impl LookupCommand {
    /// Look up in the default catalog of the global factory
    pub fn new() -> Self {
        Self::from_factory(CatalogFactory::global())
    }

    pub fn from_factory(factory: Arc<CatalogFactory>) -> Self {
        Self::from_source(CatalogSource::Factory {
            factory,
            catalog_name: None,
        })
    }

    pub fn from_catalog(catalog: Arc<Catalog>) -> Self {
        Self::from_source(CatalogSource::Catalog(catalog))
    }

    pub fn from_source(source: CatalogSource) -> Self {
        Self {
            source,
            name: None,
            name_key: None,
            optional: false,
            ignore_execute_result: false,
            ignore_postprocess_result: false,
        }
    }

    /// Use a named catalog of the factory instead of its default one
    ///
    /// Has no effect when the source is a specific catalog.
    pub fn with_catalog_name(mut self, catalog_name: impl Into<String>) -> Self {
        if let CatalogSource::Factory {
            catalog_name: slot, ..
        } = &mut self.source
        {
            *slot = Some(catalog_name.into());
        }
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read the command name from this context key
    pub fn with_name_key(mut self, name_key: impl Into<String>) -> Self {
        self.name_key = Some(name_key.into());
        self
    }

    /// Treat a missing command as a no-op instead of an error
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Always report `false` from `execute`, whatever the target returned
    pub fn ignore_execute_result(mut self, ignore: bool) -> Self {
        self.ignore_execute_result = ignore;
        self
    }

    /// Always report `false` from `postprocess`, whatever the target returned
    pub fn ignore_postprocess_result(mut self, ignore: bool) -> Self {
        self.ignore_postprocess_result = ignore;
        self
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether exactly one of `name` / `name_key` is configured
    pub(crate) fn has_single_name_source(&self) -> bool {
        self.name.is_some() != self.name_key.is_some()
    }

    /// Command name for this execution
    pub fn command_name(&self, context: &dyn Context) -> Option<String> {
        match (&self.name, &self.name_key) {
            (Some(name), _) => Some(name.clone()),
            (None, Some(key)) => context.get_str(key).map(str::to_string),
            (None, None) => None,
        }
    }

    /// Find the target command
    ///
    /// `Ok(None)` only when the command is missing and the lookup is optional.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when no name is available, the catalog is missing, or
    /// the command is missing and the lookup is not optional;
    /// `InvalidIdentifier` for a malformed qualified name.
    pub fn lookup(&self, context: &dyn Context) -> Result<Option<CommandRef>> {
        let name = self
            .command_name(context)
            .ok_or_else(|| ChainError::invalid_argument("No command name"))?;

        let (source, command) = self.target_of(&name)?;
        let found = source.resolve()?.get_command(command);

        match found {
            Some(target) => Ok(Some(target)),
            None if self.optional => {
                tracing::debug!(
                    component = module_path!(),
                    op = "lookup_command",
                    command = %name,
                    "optional command not found"
                );
                Ok(None)
            }
            None => Err(ChainError::invalid_argument(format!(
                "Cannot find command '{}' in {}",
                command,
                source.describe()
            ))),
        }
    }

    /// Catalog source and bare command name for `name`
    ///
    /// On a factory source without a catalog name, a qualified
    /// `catalog:command` name selects the named catalog. Any other source
    /// takes the name as is.
    fn target_of<'n>(&self, name: &'n str) -> Result<(CatalogSource, &'n str)> {
        match &self.source {
            CatalogSource::Factory {
                factory,
                catalog_name: None,
            } => match CommandId::parse(name)? {
                CommandId::Qualified { catalog, command } => Ok((
                    CatalogSource::Factory {
                        factory: Arc::clone(factory),
                        catalog_name: Some(catalog.to_string()),
                    },
                    command,
                )),
                CommandId::Default { command } => Ok((self.source.clone(), command)),
            },
            source => Ok((source.clone(), name)),
        }
    }
}

impl Default for LookupCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for LookupCommand {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        let Some(command) = self.lookup(&*context)? else {
            return Ok(false);
        };
        let result = command.execute(context)?;
        Ok(!self.ignore_execute_result && result)
    }

    fn as_filter(&self) -> Option<&dyn Filter> {
        Some(self)
    }
}

impl Filter for LookupCommand {
    fn postprocess(&self, context: &mut dyn Context, error: Option<&ChainError>) -> Result<bool> {
        let Some(command) = self.lookup(&*context)? else {
            return Ok(false);
        };
        let Some(filter) = command.as_filter() else {
            return Ok(false);
        };
        let result = filter.postprocess(context, error)?;
        Ok(!self.ignore_postprocess_result && result)
    }
}
