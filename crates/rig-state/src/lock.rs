//! Advisory file lock guarding the save/load boundary across processes.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rig_core::errors::{ErrorInfo, RigError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Guard holding an exclusive advisory lock; released (and the lock file
/// removed, best effort) on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Acquires the lock at `path`, polling until `timeout` elapses.
    ///
    /// The lock is advisory: it coordinates cooperating processes only.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, RigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)
            .map_err(|err| {
                RigError::Backing(
                    ErrorInfo::new("lock.create", "cannot create lock file")
                        .with_context("filename", path.display().to_string())
                        .with_hint(err.to_string()),
                )
            })?;
        let fd = file.as_raw_fd();
        let deadline = Instant::now() + timeout;
        loop {
            let ret = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
            if ret == 0 {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }
            if Instant::now() >= deadline {
                return Err(RigError::LockTimeout(
                    ErrorInfo::new("lock.timeout", "state file locked by another process")
                        .with_context("filename", path.display().to_string())
                        .with_context("timeout_ms", timeout.as_millis().to_string()),
                ));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
        let _ = std::fs::remove_file(&self.path);
    }
}
