//! Scoped, lock-protected load/save wrapper around a single state file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::error;
use rig_core::errors::RigError;

use crate::lock::FileLock;
use crate::state::State;

/// Behavior switches for a [`StateHandler`].
#[derive(Debug, Clone, PartialEq)]
pub struct StateHandlerOptions {
    /// Load the state file on entry (under the lock).
    pub load: bool,
    /// Save the state on close (under the lock).
    pub save: bool,
    /// Bounded wait for the advisory lock.
    pub timeout: Duration,
    /// Rotated generations to retain when saving.
    pub rotate_n_state_files: usize,
    /// Deflate level applied when saving.
    pub compression_level: i32,
}

impl Default for StateHandlerOptions {
    fn default() -> Self {
        Self {
            load: true,
            save: true,
            timeout: Duration::from_secs(10),
            rotate_n_state_files: 0,
            compression_level: 5,
        }
    }
}

/// Coordinates cross-process access to one state file: lock then load on
/// entry, save then unlock on close.
///
/// The lock covers the whole file and only the load/save boundary; it does
/// not serialize individual reads and writes between those points.
#[derive(Debug)]
pub struct StateHandler {
    state: State,
    filename: PathBuf,
    lock: Option<FileLock>,
    options: StateHandlerOptions,
    closed: bool,
}

impl StateHandler {
    /// Acquires the lock (when loading) and loads the state lazily; a
    /// missing or unreadable state file is tolerated.
    pub fn enter(filename: &Path, options: StateHandlerOptions) -> Result<Self, RigError> {
        let mut state = State::new();
        let lock = if options.load {
            let lock = FileLock::acquire(&lock_path(filename), options.timeout)?;
            state.load(Some(filename), true, false)?;
            Some(lock)
        } else {
            None
        };
        Ok(Self {
            state,
            filename: filename.to_path_buf(),
            lock,
            options,
            closed: false,
        })
    }

    /// The managed state.
    pub fn state(&mut self) -> &mut State {
        &mut self.state
    }

    /// Saves (when configured) and releases the lock. The lock is released
    /// even when the save fails.
    pub fn close(mut self) -> Result<(), RigError> {
        self.closed = true;
        let result = self.save_if_configured();
        self.lock = None;
        result
    }

    fn save_if_configured(&mut self) -> Result<(), RigError> {
        if !self.options.save {
            return Ok(());
        }
        if self.lock.is_none() {
            self.lock = Some(FileLock::acquire(
                &lock_path(&self.filename),
                self.options.timeout,
            )?);
        }
        self.state.save(
            &self.filename,
            self.options.rotate_n_state_files,
            self.options.compression_level,
        )
    }
}

impl Drop for StateHandler {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Unwinding path: the save is best effort, the lock release is not.
        if let Err(err) = self.save_if_configured() {
            error!("state handler save on drop failed: {err}");
        }
        self.lock = None;
    }
}

fn lock_path(filename: &Path) -> PathBuf {
    let mut name = filename.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}
