//! Persistent experiment state: change tracking, tombstoned deletion, lazy
//! on-demand loading, and saving with rotation and compression.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rig_core::errors::{ErrorInfo, RigError};
use rig_core::Value;
use rig_store::{entry_name, ArchiveWriter, StateArchive};

use crate::mapping::{split_key, HierarchicalMapping, Node, Section};
use crate::rollover::do_rollover;

/// Persistence status of a single leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// A value held in memory.
    Present(Value),
    /// A leaf known to exist in the backing file but not yet read.
    Unloaded,
    /// A tombstone: the key reads as absent and the next save purges it
    /// from the backing file.
    Deleted,
}

enum Probe {
    Present,
    Unloaded,
    Deleted,
    Missing,
}

/// Hierarchical state with lazy, crash-safe persistence.
///
/// A `State` is an owned value constructed once per process (or per
/// experiment) and threaded through the call graph; [`State::reset`] returns
/// it to the fresh, unbound condition.
#[derive(Debug)]
pub struct State {
    mapping: HierarchicalMapping<Slot>,
    changed: BTreeSet<String>,
    filename: Option<PathBuf>,
    lazy: bool,
    raise_on_load_error: bool,
}

impl State {
    /// Creates a fresh, empty, unbound state.
    pub fn new() -> Self {
        Self {
            mapping: HierarchicalMapping::new(),
            changed: BTreeSet::new(),
            filename: None,
            lazy: false,
            raise_on_load_error: true,
        }
    }

    /// Discards contents, bindings, and change tracking.
    pub fn reset(&mut self) {
        *self = State::new();
    }

    /// The backing file this state is bound to, if any.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// True when leaves are read from the backing file on demand.
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Keys written since the last save.
    pub fn changed_keys(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    fn key_not_found(key: &str) -> RigError {
        RigError::NotFound(
            ErrorInfo::new("state.missing_key", "state does not contain key")
                .with_context("key", key.to_string()),
        )
    }

    fn probe(&self, key: &str) -> Result<Probe, RigError> {
        match self.mapping.get(key) {
            Ok(Slot::Present(_)) => Ok(Probe::Present),
            Ok(Slot::Unloaded) => Ok(Probe::Unloaded),
            Ok(Slot::Deleted) => Ok(Probe::Deleted),
            Err(err) if err.is_not_found() => Ok(Probe::Missing),
            Err(err) => Err(err),
        }
    }

    /// Stores `value` under `key` and marks it changed.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), RigError> {
        self.mapping.set(key, Slot::Present(value.into()))?;
        self.changed.insert(key.to_string());
        Ok(())
    }

    /// Returns the value stored under `key`, reading it from the backing
    /// file when it has not been loaded yet.
    pub fn get(&mut self, key: &str) -> Result<&Value, RigError> {
        match self.probe(key)? {
            Probe::Present => {}
            Probe::Deleted => return Err(Self::key_not_found(key)),
            Probe::Unloaded => self.fetch(key)?,
            Probe::Missing => {
                if self.lazy && self.filename.is_some() {
                    self.fetch(key)?;
                } else {
                    return Err(Self::key_not_found(key));
                }
            }
        }
        match self.mapping.get(key)? {
            Slot::Present(value) => Ok(value),
            _ => Err(Self::key_not_found(key)),
        }
    }

    /// Tombstones `key`: observers see it as absent and the next save
    /// removes it from the backing file as well.
    pub fn delete(&mut self, key: &str) -> Result<(), RigError> {
        match self.probe(key)? {
            Probe::Present | Probe::Unloaded => {
                self.mapping.set(key, Slot::Deleted)?;
                self.changed.insert(key.to_string());
                Ok(())
            }
            Probe::Deleted | Probe::Missing => Err(Self::key_not_found(key)),
        }
    }

    /// True when a live (non-tombstoned) leaf exists under `key`. Never
    /// touches the backing file: structural presence is enough.
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.probe(key), Ok(Probe::Present | Probe::Unloaded))
    }

    /// Full dotted paths of every live leaf, in section insertion order.
    /// Placeholders count; tombstones do not; nothing is read from disk.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.mapping
            .keys()
            .filter(|key| !matches!(self.mapping.get(key), Ok(Slot::Deleted)))
    }

    /// Number of live leaves.
    pub fn len(&self) -> usize {
        self.keys().count()
    }

    /// True when no live leaves exist.
    pub fn is_empty(&self) -> bool {
        self.keys().next().is_none()
    }

    /// Returns the stored value, or stores and returns `default`.
    pub fn get_or_set(&mut self, key: &str, default: impl Into<Value>) -> Result<&Value, RigError> {
        match self.get(key) {
            Ok(_) => {}
            Err(err) if err.is_not_found() => self.set(key, default)?,
            Err(err) => return Err(err),
        }
        match self.mapping.get(key)? {
            Slot::Present(value) => Ok(value),
            _ => Err(Self::key_not_found(key)),
        }
    }

    /// Copies in every key of `other` not already present.
    pub fn merge(&mut self, other: &HierarchicalMapping<Value>) -> Result<(), RigError> {
        for key in other.keys() {
            if !self.contains(&key) {
                let value = other.get(&key)?.clone();
                self.set(&key, value)?;
            }
        }
        Ok(())
    }

    /// Returns the fully materialized section under `prefix`, reading any
    /// unloaded descendant leaves from the backing file first.
    pub fn section(&mut self, prefix: &str) -> Result<&Section<Slot>, RigError> {
        let scope = format!("{prefix}{}", crate::mapping::SECTION_SEPARATOR);
        self.materialize(Some(&scope))?;
        self.mapping.section(prefix)
    }

    /// Reads one leaf from the backing file into memory.
    fn fetch(&mut self, key: &str) -> Result<(), RigError> {
        let filename = match self.filename.clone() {
            Some(filename) => filename,
            None => return Err(Self::key_not_found(key)),
        };
        let segments = split_key(key)?;
        let result = StateArchive::open(&filename)
            .and_then(|mut archive| archive.read_value(&segments));
        let value = match result {
            Ok(value) => value,
            Err(err) if err.is_not_found() => return Err(Self::key_not_found(key)),
            Err(err) if self.raise_on_load_error => return Err(err),
            Err(err) => {
                debug!(
                    "tried to load '{key}' from '{}' but failed: {err}",
                    filename.display()
                );
                return Err(RigError::NotFound(
                    ErrorInfo::new("state.unloadable_key", "could not load key from backing file")
                        .with_context("key", key.to_string())
                        .with_context("filename", filename.display().to_string())
                        .with_hint(err.to_string()),
                ));
            }
        };
        self.mapping.set(key, Slot::Present(value))?;
        // Reading back an existing leaf is not a fresh write.
        self.changed.remove(key);
        debug!("lazily loaded '{key}' from '{}'", filename.display());
        Ok(())
    }

    /// Resolves every unloaded placeholder (optionally limited to keys
    /// under `scope`) through a single pass over the backing file.
    fn materialize(&mut self, scope: Option<&str>) -> Result<(), RigError> {
        let filename = match self.filename.clone() {
            Some(filename) => filename,
            None => return Ok(()),
        };
        let wanted: Vec<String> = self
            .mapping
            .keys()
            .filter(|key| scope.map_or(true, |scope| key.starts_with(scope)))
            .filter(|key| matches!(self.mapping.get(key), Ok(Slot::Unloaded)))
            .collect();
        if wanted.is_empty() {
            return Ok(());
        }
        let mut archive = match StateArchive::open(&filename) {
            Ok(archive) => archive,
            Err(err) if self.raise_on_load_error => return Err(err),
            Err(err) => {
                debug!(
                    "tried to load state from '{}' but failed: {err}",
                    filename.display()
                );
                return Ok(());
            }
        };
        for key in wanted {
            let segments = split_key(&key)?;
            let value = match archive.read_value(&segments) {
                Ok(value) => value,
                Err(err) if self.raise_on_load_error => return Err(err),
                Err(err) => {
                    debug!("could not materialize '{key}': {err}");
                    continue;
                }
            };
            self.mapping.set(&key, Slot::Present(value))?;
            self.changed.remove(&key);
        }
        Ok(())
    }

    /// True when there is anything worth writing to disk.
    pub fn need_saving(&self) -> bool {
        if self.mapping.is_empty() {
            debug!("no need to save empty state");
            return false;
        }
        if self.changed.is_empty() {
            debug!("no need to save unchanged state");
            return false;
        }
        true
    }

    /// Saves the state to `filename`, rotating previous generations first.
    ///
    /// Tombstoned leaves are purged from the file and from memory; unloaded
    /// placeholders carry their authoritative on-disk payload through
    /// untouched. The new container is written to a temporary sibling and
    /// renamed into place, so a failed save leaves the previous file intact
    /// and the change set uncleared.
    pub fn save(
        &mut self,
        filename: &Path,
        rotate_n_state_files: usize,
        compression_level: i32,
    ) -> Result<(), RigError> {
        if !self.need_saving() {
            debug!("state does not need saving");
            return Ok(());
        }
        let lazy_source = if self.lazy { self.filename.clone() } else { None };
        do_rollover(filename, rotate_n_state_files, lazy_source.as_deref())?;
        debug!("saving state to '{}'", filename.display());

        let mut carry_source = if filename.exists() {
            StateArchive::open(filename).ok()
        } else {
            None
        };
        if carry_source.is_none() {
            if let Some(source) = lazy_source.as_deref() {
                if source.exists() {
                    carry_source = StateArchive::open(source).ok();
                }
            }
        }

        let tmp = temp_path(filename);
        let result = self
            .write_container(&tmp, &mut carry_source, compression_level)
            .and_then(|tombstones| {
                fs::rename(&tmp, filename).map_err(|err| {
                    RigError::Backing(
                        ErrorInfo::new("state.rename", "cannot move container into place")
                            .with_hint(err.to_string()),
                    )
                })?;
                Ok(tombstones)
            });
        match result {
            Ok(tombstones) => {
                for key in tombstones {
                    let _ = self.mapping.remove(&key);
                }
                self.changed.clear();
                info!("saved state to '{}'", filename.display());
                Ok(())
            }
            Err(err) => {
                let _ = fs::remove_file(&tmp);
                Err(RigError::Backing(
                    ErrorInfo::new("state.save", "cannot save state to file")
                        .with_context("filename", filename.display().to_string())
                        .with_hint(err.to_string()),
                ))
            }
        }
    }

    fn write_container(
        &self,
        tmp: &Path,
        carry_source: &mut Option<StateArchive>,
        compression_level: i32,
    ) -> Result<Vec<String>, RigError> {
        let mut writer = ArchiveWriter::create(tmp, compression_level)?;
        let mut tombstones = Vec::new();
        let mut visited = BTreeSet::new();
        let keys: Vec<String> = self.mapping.keys().collect();
        for key in &keys {
            let segments = split_key(key)?;
            let name = entry_name(&segments);
            match self.mapping.get(key)? {
                Slot::Present(value) => writer.write_value(&segments, value)?,
                Slot::Unloaded => {
                    if let Some(archive) = carry_source.as_mut() {
                        match archive.read_raw(&name) {
                            Ok(payload) => writer.write_raw(&name, &payload)?,
                            Err(err) if err.is_not_found() => {}
                            Err(err) => return Err(err),
                        }
                    }
                }
                Slot::Deleted => tombstones.push(key.clone()),
            }
            visited.insert(name);
        }
        // Entries outside the in-memory tree survive the rewrite.
        if let Some(archive) = carry_source.as_mut() {
            for name in archive.entry_names()? {
                if name.ends_with('/') || visited.contains(&name) {
                    continue;
                }
                let payload = archive.read_raw(&name)?;
                writer.write_raw(&name, &payload)?;
            }
        }
        writer.finish()?;
        Ok(tombstones)
    }

    /// Loads state from `filename` (or the bound filename).
    ///
    /// The structural skeleton is always read eagerly so `keys`, `contains`
    /// and `len` work immediately; leaf payloads follow on demand when
    /// `lazy`, or right away otherwise. With `raise_error` false, I/O
    /// failures are logged and the state keeps whatever was loaded so far.
    pub fn load(
        &mut self,
        filename: Option<&Path>,
        lazy: bool,
        raise_error: bool,
    ) -> Result<(), RigError> {
        let filename = match filename.map(Path::to_path_buf).or_else(|| self.filename.clone()) {
            Some(filename) => filename,
            None => {
                return Err(RigError::Uninitialized(ErrorInfo::new(
                    "state.no_filename",
                    "cannot load state without a filename",
                )))
            }
        };
        self.mapping.clear();
        self.changed.clear();
        self.lazy = lazy;
        self.raise_on_load_error = raise_error;
        self.filename = Some(filename.clone());

        let skeleton = StateArchive::open(&filename).and_then(|mut archive| archive.leaf_paths());
        let paths = match skeleton {
            Ok(paths) => paths,
            Err(err) if raise_error => return Err(err),
            Err(err) => {
                debug!(
                    "tried to load state from '{}' but failed: {err}",
                    filename.display()
                );
                return Ok(());
            }
        };
        info!("loading state from '{}'", filename.display());
        for segments in &paths {
            let key = segments.join(".");
            self.mapping.set(&key, Slot::Unloaded)?;
        }
        if !lazy {
            // Respects `raise_error` through the flag set above.
            self.materialize(None)?;
        }
        self.changed.clear();
        Ok(())
    }

    /// Pretty-prints the tree, materializing any unloaded leaves first.
    /// Tombstones are not printed; placeholders are resolved, never shown.
    pub fn show(&mut self) -> Result<String, RigError> {
        self.materialize(None)?;
        let mut out = String::new();
        show_section(self.mapping.base(), " ", &mut out);
        Ok(out)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

fn show_section(section: &Section<Slot>, prefix: &str, out: &mut String) {
    for (key, node) in section.iter() {
        match node {
            Node::Section(sub) => {
                let _ = writeln!(out, "{prefix}[{key}]");
                show_section(sub, &format!("{prefix}  "), out);
            }
            Node::Leaf(Slot::Present(value)) => {
                let _ = writeln!(out, "{prefix}{key}: {value:?}");
            }
            Node::Leaf(_) => {}
        }
    }
}

fn temp_path(filename: &Path) -> PathBuf {
    let mut name = filename.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
