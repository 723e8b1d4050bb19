//! Relay Core - Chain-of-Responsibility execution engine
//!
//! This crate provides the building blocks for running request-scoped
//! pipelines of pluggable commands:
//! - `Context`: ordered key-value state shared by one execution
//! - `Command` / `Filter`: the unit contract, with post-processing on unwind
//! - `Chain`: ordered composite command with short-circuit and unwind semantics
//! - `Catalog` / `CatalogFactory`: thread-safe registries with `catalog:command` lookup
//! - Stock lookup, by-name dispatch and context-manipulation commands
//!
//! Host adapters (HTTP, CLI, configuration loaders) populate a context and a
//! catalog; everything else lives here.

pub mod catalog;
pub mod catalog_factory;
pub mod chain;
pub mod command;
pub mod context;
pub mod errors;
pub mod generic;
pub mod logging_facility;
pub mod method;

// Re-export commonly used types
pub use catalog::Catalog;
pub use catalog_factory::CatalogFactory;
pub use chain::Chain;
pub use command::{Command, CommandRef, Filter, CONTINUE_PROCESSING, PROCESSING_COMPLETE};
pub use context::{Context, ContextBase};
pub use errors::{ChainError, ExError, ExErrorKind, Result};
