//! Ordered pipelines of commands
//!
//! A [`Chain`] is itself a [`Command`]. Executing it runs its members in
//! order until one of them reports completion or fails, then walks back over
//! the members that ran and gives every [`Filter`] among them a chance to
//! post-process (and possibly handle) the outcome.
//!
//! ## Lifecycle
//!
//! A chain starts out `Building`: commands may be appended. The first call to
//! `execute` freezes it; from then on `add_command` fails with
//! `IllegalState`. The transition happens under the chain's lock, so two
//! threads racing a first execution against an append cannot both win.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use relay_core::chain::Chain;
//! use relay_core::command::{Command, FnCommand};
//! use relay_core::context::{Context, ContextBase};
//! use serde_json::json;
//!
//! let chain = Chain::new();
//! chain.add_command(Arc::new(FnCommand::new(|ctx: &mut dyn Context| {
//!     ctx.put("seen".to_string(), json!(true));
//!     Ok(false)
//! }))).unwrap();
//!
//! let mut ctx = ContextBase::new();
//! assert!(!chain.execute(&mut ctx).unwrap());
//! assert!(chain.is_frozen());
//! assert!(chain.add_command(Arc::new(FnCommand::new(|_: &mut dyn Context| Ok(true)))).is_err());
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::command::{Command, CommandRef, Filter};
use crate::context::Context;
use crate::errors::{ChainError, Result};
use crate::{log_op_end, log_op_error, log_op_start};

/// One member of a chain, with its filter capability resolved on append
#[derive(Clone)]
struct Link {
    command: CommandRef,
    is_filter: bool,
}

impl Link {
    fn new(command: CommandRef) -> Self {
        let is_filter = command.as_filter().is_some();
        Self { command, is_filter }
    }

    fn filter(&self) -> Option<&dyn Filter> {
        if self.is_filter {
            self.command.as_filter()
        } else {
            None
        }
    }
}

/// Storage state of a chain
enum ChainState {
    Building(Vec<Link>),
    Frozen(Arc<[Link]>),
}

/// Outcome of the forward pass
struct ForwardPass {
    /// Index of the last member that ran; `None` for an empty chain
    stop_index: Option<usize>,
    result: bool,
    error: Option<ChainError>,
}

/// Ordered composite command with short-circuit and unwind semantics
pub struct Chain {
    state: Mutex<ChainState>,
}

impl Chain {
    /// Create an empty chain in the `Building` state
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::Building(Vec::new())),
        }
    }

    /// Create a chain holding `commands` in iteration order
    pub fn from_commands<I>(commands: I) -> Self
    where
        I: IntoIterator<Item = CommandRef>,
    {
        let links = commands.into_iter().map(Link::new).collect();
        Self {
            state: Mutex::new(ChainState::Building(links)),
        }
    }

    /// Builder-style append for wiring chains at startup
    ///
    /// # Errors
    ///
    /// `IllegalState` if the chain has already been executed.
    pub fn with_command(self, command: CommandRef) -> Result<Self> {
        self.add_command(command)?;
        Ok(self)
    }

    /// Append a command
    ///
    /// # Errors
    ///
    /// `IllegalState` once the chain has been executed.
    pub fn add_command(&self, command: CommandRef) -> Result<()> {
        let mut state = self.lock();
        match &mut *state {
            ChainState::Building(links) => {
                links.push(Link::new(command));
                Ok(())
            }
            ChainState::Frozen(_) => {
                let err = ChainError::illegal_state("cannot add a command to a chain that has been executed");
                log_op_error!("chain_add_command", err, duration_ms = 0u64);
                Err(err)
            }
        }
    }

    /// Whether `execute` has been called at least once
    pub fn is_frozen(&self) -> bool {
        matches!(&*self.lock(), ChainState::Frozen(_))
    }

    pub fn len(&self) -> usize {
        match &*self.lock() {
            ChainState::Building(links) => links.len(),
            ChainState::Frozen(links) => links.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the member commands in execution order
    pub fn commands(&self) -> Vec<CommandRef> {
        let state = self.lock();
        let links: &[Link] = match &*state {
            ChainState::Building(links) => links,
            ChainState::Frozen(links) => links,
        };
        links.iter().map(|l| Arc::clone(&l.command)).collect()
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Freeze the chain (idempotent) and return the member snapshot
    fn freeze(&self) -> Arc<[Link]> {
        let mut state = self.lock();
        let frozen: Arc<[Link]> = match &mut *state {
            ChainState::Building(links) => Arc::from(std::mem::take(links)),
            ChainState::Frozen(links) => return Arc::clone(links),
        };
        *state = ChainState::Frozen(Arc::clone(&frozen));
        frozen
    }

    fn run_forward(links: &[Link], context: &mut dyn Context) -> ForwardPass {
        for (index, link) in links.iter().enumerate() {
            match link.command.execute(context) {
                Ok(true) => {
                    return ForwardPass {
                        stop_index: Some(index),
                        result: true,
                        error: None,
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    return ForwardPass {
                        stop_index: Some(index),
                        result: false,
                        error: Some(err),
                    }
                }
            }
        }

        // Falling off the end unwinds from the last member.
        ForwardPass {
            stop_index: links.len().checked_sub(1),
            result: false,
            error: None,
        }
    }

    /// Post-process executed filters from `stop_index` down to 0
    ///
    /// Returns whether any filter handled the error.
    fn unwind(
        links: &[Link],
        stop_index: usize,
        context: &mut dyn Context,
        error: Option<&ChainError>,
    ) -> bool {
        let mut handled = false;
        for (index, link) in links[..=stop_index].iter().enumerate().rev() {
            let Some(filter) = link.filter() else {
                continue;
            };
            match filter.postprocess(context, error) {
                Ok(true) => handled = true,
                Ok(false) => {}
                Err(err) => {
                    // Secondary failures never replace the original outcome.
                    tracing::warn!(
                        component = module_path!(),
                        op = "chain_postprocess",
                        event = relay_core_types::schema::EVENT_POSTPROCESS_FAILED,
                        index = index as u64,
                        err.code = err.kind().code(),
                        error = %err,
                    );
                }
            }
        }
        handled
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for Chain {
    fn execute(&self, context: &mut dyn Context) -> Result<bool> {
        let started = Instant::now();
        let links = self.freeze();
        log_op_start!("chain_execute", chain_len = links.len() as u64);

        let pass = Self::run_forward(&links, context);

        let handled = match pass.stop_index {
            Some(stop_index) => Self::unwind(&links, stop_index, context, pass.error.as_ref()),
            None => false,
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match pass.error {
            Some(err) if !handled => {
                log_op_error!("chain_execute", err, duration_ms = duration_ms);
                Err(err)
            }
            _ => {
                log_op_end!(
                    "chain_execute",
                    duration_ms = duration_ms,
                    result = pass.result,
                    handled = handled
                );
                Ok(pass.result)
            }
        }
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("len", &self.len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}
