//! Structured logging for chain execution and registry lookups
//!
//! Every event carries `component` (the emitting module), `op` and, for
//! lifecycle events, `event`. The engine emits:
//!
//! | op                           | event                | level |
//! |------------------------------|----------------------|-------|
//! | `chain_execute`              | `start` / `end`      | debug |
//! | `chain_execute`              | `end_error`          | error |
//! | `chain_add_command`          | `end_error`          | error |
//! | `chain_postprocess`          | `postprocess_failed` | warn  |
//! | `catalog_factory_get_command`| `lookup_miss`        | warn  |
//!
//! Lookups, dispatches and catalog replacements add debug events without an
//! `event` field.
//!
//! The host installs a subscriber once with [`init`]; tests record events
//! with [`init_test_capture`] instead.
//!
//! ```rust
//! use relay_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
