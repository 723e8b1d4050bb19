//! Named registry of commands
//!
//! A [`Catalog`] is built once at startup and then read concurrently by
//! every request. Registration is last-write-wins and never fails; lookups
//! return `None` for unknown names.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::command::{Command, CommandRef};

/// Thread-safe name → command registry
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use relay_core::catalog::Catalog;
/// use relay_core::chain::Chain;
///
/// let catalog = Catalog::new();
/// catalog.add_command("checkout", Arc::new(Chain::new()));
/// assert!(catalog.get_command("checkout").is_some());
/// assert!(catalog.get_command("refund").is_none());
/// ```
#[derive(Default)]
pub struct Catalog {
    commands: RwLock<BTreeMap<String, CommandRef>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration for startup wiring
    pub fn with_command(self, name: impl Into<String>, command: CommandRef) -> Self {
        self.add_command(name, command);
        self
    }

    /// Register `command` under `name`, replacing any previous registration
    pub fn add_command(&self, name: impl Into<String>, command: CommandRef) {
        let name = name.into();
        if self.write().insert(name.clone(), command).is_some() {
            tracing::debug!(
                component = module_path!(),
                op = "catalog_add_command",
                command = %name,
                "replaced existing registration"
            );
        }
    }

    /// Register a concrete command value under `name`
    pub fn add<C: Command + 'static>(&self, name: impl Into<String>, command: C) {
        self.add_command(name, Arc::new(command));
    }

    /// Command registered under `name`
    pub fn get_command(&self, name: &str) -> Option<CommandRef> {
        self.read().get(name).cloned()
    }

    /// Unregister `name`, returning the command it held
    pub fn remove_command(&self, name: &str) -> Option<CommandRef> {
        self.write().remove(name)
    }

    /// Names registered at the time of the call, sorted
    ///
    /// The iterator walks a snapshot, so concurrent registrations never
    /// disturb an enumeration in progress.
    pub fn names(&self) -> impl Iterator<Item = String> {
        let snapshot: Vec<String> = self.read().keys().cloned().collect();
        snapshot.into_iter()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, CommandRef>> {
        self.commands.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, CommandRef>> {
        self.commands.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("commands", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
