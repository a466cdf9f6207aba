//! Prefix-scoped view onto a state instance.

use rig_core::errors::RigError;
use rig_core::Value;

use crate::mapping::{split_key, SECTION_SEPARATOR};
use crate::state::State;

/// Delegating wrapper that prepends a fixed prefix to every key, scoping a
/// borrowed [`State`] to one sub-section.
#[derive(Debug)]
pub struct SubState<'a> {
    state: &'a mut State,
    prefix: String,
}

impl<'a> SubState<'a> {
    /// Scopes `state` to the section named by `prefix`.
    pub fn new(state: &'a mut State, prefix: &str) -> Result<Self, RigError> {
        split_key(prefix)?;
        Ok(Self {
            state,
            prefix: prefix.to_string(),
        })
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, SECTION_SEPARATOR, key)
    }

    /// Stores `value` under the scoped key.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), RigError> {
        let scoped = self.scoped(key);
        self.state.set(&scoped, value)
    }

    /// Returns the value stored under the scoped key.
    pub fn get(&mut self, key: &str) -> Result<&Value, RigError> {
        let scoped = self.scoped(key);
        self.state.get(&scoped)
    }

    /// Tombstones the scoped key.
    pub fn delete(&mut self, key: &str) -> Result<(), RigError> {
        let scoped = self.scoped(key);
        self.state.delete(&scoped)
    }

    /// True when a live leaf exists under the scoped key.
    pub fn contains(&self, key: &str) -> bool {
        self.state.contains(&self.scoped(key))
    }

    /// Returns the stored value, or stores and returns `default`.
    pub fn get_or_set(&mut self, key: &str, default: impl Into<Value>) -> Result<&Value, RigError> {
        let scoped = self.scoped(key);
        self.state.get_or_set(&scoped, default)
    }

    /// Live leaf paths under the prefix, relative to it.
    pub fn keys(&self) -> Vec<String> {
        let scope = format!("{}{}", self.prefix, SECTION_SEPARATOR);
        self.state
            .keys()
            .filter_map(|key| key.strip_prefix(&scope).map(str::to_string))
            .collect()
    }
}
