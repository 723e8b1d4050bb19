//! Core types shared across Relay facilities
//!
//! This crate provides foundational constants used by both the error
//! facility and the logging facility:
//!
//! - **Schema constants**: canonical field keys and event names
//! - **Identifier grammar**: the `catalog:command` delimiter

pub mod schema;

/// Delimiter separating a catalog name from a command name in a composite
/// command identifier (`catalogName:commandName`).
pub const IDENTIFIER_DELIMITER: char = ':';
