//! Cross-process lock guarding paid-flag flips.
//!
//! The notice generator must not race a second instance (for example one
//! restarted by a supervisor) when it flips a notice to paid. An advisory
//! `flock` on a well-known lock file guarantees a single holder across
//! processes. If the lock file cannot be created the generator refuses to
//! start; there is no unguarded fallback.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("cannot open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("flock on {path} failed: {source}")]
    Flock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct CrossProcessLock {
    file: File,
    path: PathBuf,
}

impl CrossProcessLock {
    /// Open (creating if needed) the lock file. Called once at startup;
    /// failure here is fatal to the caller.
    pub fn create(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LockError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| LockError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Take the exclusive lock. Blocking, but hold times are a single list
    /// scan and one frame write, so contention is microseconds.
    pub fn acquire(&self) -> Result<LockGuard<'_>, LockError> {
        flock(&self.file, libc::LOCK_EX).map_err(|source| LockError::Flock {
            path: self.path.clone(),
            source,
        })?;
        Ok(LockGuard { lock: self })
    }
}

/// Holds the exclusive lock until dropped.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a CrossProcessLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = flock(&self.lock.file, libc::LOCK_UN) {
            tracing::warn!(path = %self.lock.path.display(), error = %e, "failed to release lock");
        }
    }
}

fn flock(file: &File, operation: libc::c_int) -> std::io::Result<()> {
    // Retry on EINTR; flock has no other transient failures we can handle.
    loop {
        let rc = unsafe { libc::flock(file.as_raw_fd(), operation) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}
