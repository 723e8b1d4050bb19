//! Directory of catalogs
//!
//! A [`CatalogFactory`] holds at most one default [`Catalog`] plus any number
//! of named ones, and resolves composite command identifiers:
//!
//! ```text
//! identifier := name | catalogName ":" commandName
//! ```
//!
//! Factories are ordinary values that can be handed to whatever needs them.
//! For hosts that want implicit sharing, [`CatalogFactory::instance`] keeps one
//! factory per isolation scope (an application, a tenant, a test) in a
//! process-wide registry; [`CatalogFactory::release`] tears a scope down.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use relay_core_types::schema::EVENT_LOOKUP_MISS;
use relay_core_types::IDENTIFIER_DELIMITER;

use crate::catalog::Catalog;
use crate::command::CommandRef;
use crate::errors::{ChainError, ExError, ExErrorKind, Result};

const OP_GET_COMMAND: &str = "catalog_factory_get_command";

/// Scope used by [`CatalogFactory::global`]
pub const DEFAULT_SCOPE: &str = "default";

#[derive(Default)]
struct Catalogs {
    default: Option<Arc<Catalog>>,
    named: BTreeMap<String, Arc<Catalog>>,
}

/// Default catalog + named catalogs, with composite command lookup
#[derive(Default)]
pub struct CatalogFactory {
    catalogs: RwLock<Catalogs>,
}

type ScopeRegistry = RwLock<HashMap<String, Arc<CatalogFactory>>>;

static SCOPES: OnceLock<ScopeRegistry> = OnceLock::new();

fn scopes() -> &'static ScopeRegistry {
    SCOPES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// A parsed command identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId<'a> {
    /// Command in the default catalog
    Default { command: &'a str },
    /// Command in a named catalog
    Qualified { catalog: &'a str, command: &'a str },
}

impl<'a> CommandId<'a> {
    /// Split an identifier on the catalog delimiter
    ///
    /// # Errors
    ///
    /// `InvalidIdentifier` if `identifier` contains more than one delimiter.
    pub fn parse(identifier: &'a str) -> Result<Self> {
        match identifier.split_once(IDENTIFIER_DELIMITER) {
            None => Ok(CommandId::Default {
                command: identifier,
            }),
            Some((_, rest)) if rest.contains(IDENTIFIER_DELIMITER) => {
                Err(ChainError::InvalidIdentifier {
                    identifier: identifier.to_string(),
                })
            }
            Some((catalog, command)) => Ok(CommandId::Qualified { catalog, command }),
        }
    }

    pub fn command(&self) -> &'a str {
        match self {
            CommandId::Default { command } | CommandId::Qualified { command, .. } => command,
        }
    }
}

impl CatalogFactory {
    /// Create a standalone factory, not registered in any scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared factory for `scope`, created on first access
    pub fn instance(scope: &str) -> Arc<CatalogFactory> {
        if let Some(factory) = scopes()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(scope)
        {
            return Arc::clone(factory);
        }

        let mut registry = scopes().write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(registry.entry(scope.to_string()).or_insert_with(|| {
            tracing::debug!(
                component = module_path!(),
                op = "catalog_factory_instance",
                scope = %scope,
                "created catalog factory for scope"
            );
            Arc::new(CatalogFactory::new())
        }))
    }

    /// Shared factory of the [`DEFAULT_SCOPE`]
    pub fn global() -> Arc<CatalogFactory> {
        Self::instance(DEFAULT_SCOPE)
    }

    /// Clear the factory of `scope` and drop it from the registry
    ///
    /// Holders of the old `Arc` see an empty factory; the next
    /// `instance(scope)` creates a fresh one. Safe to call for scopes that
    /// were never created.
    pub fn release(scope: &str) {
        let removed = scopes()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(scope);
        if let Some(factory) = removed {
            factory.clear();
        }
    }

    /// The default catalog
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.read().default.clone()
    }

    /// Replace the default catalog
    pub fn set_catalog(&self, catalog: Arc<Catalog>) {
        self.write().default = Some(catalog);
    }

    /// Catalog registered under `name`
    pub fn get_catalog(&self, name: &str) -> Option<Arc<Catalog>> {
        self.read().named.get(name).cloned()
    }

    /// Register a named catalog, replacing any previous one
    pub fn add_catalog(&self, name: impl Into<String>, catalog: Arc<Catalog>) {
        self.write().named.insert(name.into(), catalog);
    }

    /// Names of the registered named catalogs, sorted, as a snapshot
    pub fn names(&self) -> impl Iterator<Item = String> {
        let snapshot: Vec<String> = self.read().named.keys().cloned().collect();
        snapshot.into_iter()
    }

    /// Resolve a composite command identifier
    ///
    /// A missing catalog or command yields `Ok(None)`; a missing catalog is
    /// also logged as a warning.
    ///
    /// # Errors
    ///
    /// `InvalidIdentifier` if `identifier` contains more than one delimiter.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use relay_core::catalog::Catalog;
    /// use relay_core::catalog_factory::CatalogFactory;
    /// use relay_core::chain::Chain;
    ///
    /// let factory = CatalogFactory::new();
    /// let admin = Arc::new(Catalog::new().with_command("purge", Arc::new(Chain::new())));
    /// factory.add_catalog("admin", admin);
    ///
    /// assert!(factory.get_command("admin:purge").unwrap().is_some());
    /// assert!(factory.get_command("purge").unwrap().is_none());
    /// assert!(factory.get_command("admin:purge:now").is_err());
    /// ```
    pub fn get_command(&self, identifier: &str) -> Result<Option<CommandRef>> {
        let id = CommandId::parse(identifier)?;

        let catalog = match id {
            CommandId::Default { .. } => self.catalog(),
            CommandId::Qualified { catalog: name, .. } => self.get_catalog(name),
        };
        if catalog.is_none() {
            let miss = ExError::new(ExErrorKind::NotFound)
                .with_op(OP_GET_COMMAND)
                .with_command(identifier);
            let miss = match id {
                CommandId::Default { .. } => miss.with_message("no default catalog"),
                CommandId::Qualified { catalog: name, .. } => miss
                    .with_catalog(name)
                    .with_message("no catalog found for name"),
            };
            tracing::warn!(
                component = module_path!(),
                op = OP_GET_COMMAND,
                event = EVENT_LOOKUP_MISS,
                err.code = miss.code(),
                catalog = miss.catalog(),
                error = %miss,
            );
        }

        Ok(catalog.and_then(|c| c.get_command(id.command())))
    }

    /// Drop the default catalog and every named catalog
    pub fn clear(&self) {
        let mut catalogs = self.write();
        catalogs.default = None;
        catalogs.named.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, Catalogs> {
        self.catalogs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Catalogs> {
        self.catalogs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CatalogFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let catalogs = self.read();
        f.debug_struct("CatalogFactory")
            .field("default", &catalogs.default.is_some())
            .field("named", &catalogs.named.keys().collect::<Vec<_>>())
            .finish()
    }
}
