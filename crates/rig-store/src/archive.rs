//! Zip-backed hierarchical container for persisted state.
//!
//! Leaf entries live under a single `state/` root group; nested sections map
//! to nested entry path segments. Payloads carry the tag described in
//! [`crate::codec`].

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use rig_core::errors::{ErrorInfo, RigError};
use rig_core::Value;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::codec::{decode_value, encode_value};

/// Name of the root group all state entries live under.
pub const ROOT_GROUP: &str = "state";

/// Builds the container entry name for a key path.
pub fn entry_name<S: AsRef<str>>(segments: &[S]) -> String {
    let mut name = String::from(ROOT_GROUP);
    for segment in segments {
        name.push('/');
        name.push_str(segment.as_ref());
    }
    name
}

/// Read handle onto an existing container file.
#[derive(Debug)]
pub struct StateArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl StateArchive {
    /// Opens the container at `path`.
    pub fn open(path: &Path) -> Result<Self, RigError> {
        let file = File::open(path).map_err(|err| {
            RigError::Backing(
                ErrorInfo::new("store.open", "cannot open state container")
                    .with_context("filename", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        let archive = ZipArchive::new(file).map_err(|err| {
            RigError::Backing(
                ErrorInfo::new("store.read_directory", "cannot read container directory")
                    .with_context("filename", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Path this archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entry names, in stored (central directory) order.
    pub fn entry_names(&mut self) -> Result<Vec<String>, RigError> {
        let mut names = Vec::with_capacity(self.archive.len());
        for idx in 0..self.archive.len() {
            let entry = match self.archive.by_index_raw(idx) {
                Ok(entry) => entry,
                Err(err) => {
                    return Err(RigError::Backing(
                        ErrorInfo::new("store.entry_index", "cannot read container entry")
                            .with_context("filename", self.path.display().to_string())
                            .with_hint(err.to_string()),
                    ))
                }
            };
            names.push(entry.name().to_string());
        }
        Ok(names)
    }

    /// Key paths of every leaf under the root group, in stored order.
    pub fn leaf_paths(&mut self) -> Result<Vec<Vec<String>>, RigError> {
        let prefix = format!("{ROOT_GROUP}/");
        let mut paths = Vec::new();
        for name in self.entry_names()? {
            if !name.starts_with(&prefix) || name.ends_with('/') {
                continue;
            }
            let segments: Vec<String> = name[prefix.len()..]
                .split('/')
                .map(|segment| segment.to_string())
                .collect();
            paths.push(segments);
        }
        Ok(paths)
    }

    /// True when the container holds an entry with the given name.
    pub fn contains_entry(&self, name: &str) -> bool {
        self.archive.file_names().any(|existing| existing == name)
    }

    /// Reads an entry's decompressed payload, tag byte included.
    pub fn read_raw(&mut self, name: &str) -> Result<Vec<u8>, RigError> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(RigError::NotFound(
                    ErrorInfo::new("store.entry_missing", "container has no such entry")
                        .with_context("entry", name.to_string())
                        .with_context("filename", self.path.display().to_string()),
                ))
            }
            Err(err) => {
                return Err(RigError::Backing(
                    ErrorInfo::new("store.entry_read", "cannot read container entry")
                        .with_context("entry", name.to_string())
                        .with_context("filename", self.path.display().to_string())
                        .with_hint(err.to_string()),
                ))
            }
        };
        let mut payload = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut payload).map_err(|err| {
            RigError::Backing(
                ErrorInfo::new("store.entry_payload", "cannot read entry payload")
                    .with_context("entry", name.to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        Ok(payload)
    }

    /// Reads and decodes the leaf at the given key path.
    pub fn read_value<S: AsRef<str>>(&mut self, segments: &[S]) -> Result<Value, RigError> {
        let payload = self.read_raw(&entry_name(segments))?;
        decode_value(&payload)
    }
}

/// Write handle producing a new container file.
pub struct ArchiveWriter {
    path: PathBuf,
    zip: ZipWriter<File>,
    options: FileOptions,
}

impl ArchiveWriter {
    /// Creates a fresh container at `path` with the given deflate level.
    pub fn create(path: &Path, compression_level: i32) -> Result<Self, RigError> {
        let file = File::create(path).map_err(|err| {
            RigError::Backing(
                ErrorInfo::new("store.create", "cannot create state container")
                    .with_context("filename", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level));
        Ok(Self {
            path: path.to_path_buf(),
            zip: ZipWriter::new(file),
            options,
        })
    }

    /// Writes a pre-encoded payload under the given entry name.
    pub fn write_raw(&mut self, name: &str, payload: &[u8]) -> Result<(), RigError> {
        self.zip.start_file(name, self.options).map_err(|err| {
            RigError::Backing(
                ErrorInfo::new("store.start_entry", "cannot start container entry")
                    .with_context("entry", name.to_string())
                    .with_context("filename", self.path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        self.zip.write_all(payload).map_err(|err| {
            RigError::Backing(
                ErrorInfo::new("store.write_entry", "cannot write container entry")
                    .with_context("entry", name.to_string())
                    .with_context("filename", self.path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })
    }

    /// Encodes and writes the leaf at the given key path.
    pub fn write_value<S: AsRef<str>>(
        &mut self,
        segments: &[S],
        value: &Value,
    ) -> Result<(), RigError> {
        let payload = encode_value(value)?;
        self.write_raw(&entry_name(segments), &payload)
    }

    /// Finalizes the container directory and flushes it to disk.
    pub fn finish(mut self) -> Result<(), RigError> {
        self.zip.finish().map_err(|err| {
            RigError::Backing(
                ErrorInfo::new("store.finish", "cannot finalize state container")
                    .with_context("filename", self.path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        Ok(())
    }
}
