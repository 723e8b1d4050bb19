//! Stock commands
//!
//! - [`LookupCommand`]: delegate to a command found in a catalog
//! - [`DispatchLookupCommand`]: call a named method of a command found in a catalog
//! - [`DispatchCommand`]: call a named method of its own method table
//! - [`CopyCommand`] / [`RemoveCommand`]: move values around in the context

pub mod copy;
pub mod dispatch;
pub mod dispatch_lookup;
pub mod lookup;
pub mod remove;

pub use copy::CopyCommand;
pub use dispatch::{ArgumentBuilder, DispatchCommand};
pub use dispatch_lookup::DispatchLookupCommand;
pub use lookup::{CatalogSource, LookupCommand};
pub use remove::RemoveCommand;
