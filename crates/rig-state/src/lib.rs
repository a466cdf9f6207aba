//! Hierarchical dotted-key mapping with lazy, crash-safe persistence.
//!
//! [`HierarchicalMapping`] is the pure in-memory container; [`State`] adds
//! change tracking, tombstoned deletion, lazy loading from a backing
//! container file, and saving with rotation and compression;
//! [`StateHandler`] wraps a state file in an advisory inter-process lock
//! for the load/save boundary.

mod handler;
mod lock;
mod mapping;
mod rollover;
mod scoped;
mod state;

pub use handler::{StateHandler, StateHandlerOptions};
pub use lock::FileLock;
pub use mapping::{
    split_key, HierarchicalMapping, Keys, Node, Section, RESERVED_GROUP_CHAR, SECTION_SEPARATOR,
};
pub use scoped::SubState;
pub use state::{Slot, State};
