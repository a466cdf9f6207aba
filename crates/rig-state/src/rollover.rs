//! Numbered backup rotation for state files.

use std::fs;
use std::path::{Path, PathBuf};

use rig_core::errors::{ErrorInfo, RigError};

fn numbered(filename: &Path, index: usize) -> PathBuf {
    let mut name = filename.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn wrap_io(code: &str, message: &str, path: &Path, err: std::io::Error) -> RigError {
    RigError::Backing(
        ErrorInfo::new(code, message)
            .with_context("filename", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

/// Shifts numbered backups of `filename` up by one slot and moves the
/// current file into slot 1.
///
/// When the state is lazily bound to `filename` itself the current file is
/// copied instead of moved, keeping in-flight lazy reads valid. When it is
/// lazily bound to a different file, that file becomes the new base of
/// `filename` after the shift.
pub(crate) fn do_rollover(
    filename: &Path,
    rotate_n_state_files: usize,
    lazy_source: Option<&Path>,
) -> Result<(), RigError> {
    if rotate_n_state_files == 0 {
        return Ok(());
    }
    for index in (1..rotate_n_state_files).rev() {
        let source = numbered(filename, index);
        let destination = numbered(filename, index + 1);
        if source.exists() {
            if destination.exists() {
                fs::remove_file(&destination).map_err(|err| {
                    wrap_io("rollover.remove", "cannot drop old backup", &destination, err)
                })?;
            }
            fs::rename(&source, &destination).map_err(|err| {
                wrap_io("rollover.shift", "cannot shift backup", &source, err)
            })?;
        }
    }
    let destination = numbered(filename, 1);
    if destination.exists() {
        fs::remove_file(&destination).map_err(|err| {
            wrap_io("rollover.remove", "cannot drop old backup", &destination, err)
        })?;
    }
    if filename.exists() {
        match lazy_source {
            Some(source) if source == filename => {
                fs::copy(filename, &destination).map_err(|err| {
                    wrap_io("rollover.copy", "cannot copy current state file", filename, err)
                })?;
            }
            Some(source) => {
                fs::rename(filename, &destination).map_err(|err| {
                    wrap_io("rollover.rotate", "cannot rotate state file", filename, err)
                })?;
                if source.exists() {
                    fs::copy(source, filename).map_err(|err| {
                        wrap_io("rollover.copy", "cannot copy lazy source", source, err)
                    })?;
                }
            }
            None => {
                fs::rename(filename, &destination).map_err(|err| {
                    wrap_io("rollover.rotate", "cannot rotate state file", filename, err)
                })?;
            }
        }
    }
    Ok(())
}
