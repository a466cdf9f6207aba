#![deny(missing_docs)]
#![doc = "Shared error and value types for the rig experiment harness."]

pub mod config;
pub mod errors;
mod value;

pub use config::{ConfigView, StateSettings};
pub use errors::{ErrorInfo, RigError};
pub use value::Value;
