//! Lock-guarded atomic file replacement
//!
//! A write claims `<path><lock_suffix>` with an exclusive create, stages the
//! content in a temporary file next to the target and renames it into place.
//! Readers see either the previous file or the complete new one.

use crate::config::OutputConfig;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Errors raised by [`AtomicWriter::write`]
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Output {path} is locked by another writer")]
    LockHeld { path: PathBuf },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Writes whole files under a lock marker
#[derive(Debug, Clone)]
pub struct AtomicWriter {
    lock_suffix: String,
    stale_after: Duration,
}

impl Default for AtomicWriter {
    fn default() -> Self {
        Self::from_config(&OutputConfig::default())
    }
}

impl AtomicWriter {
    pub fn new(lock_suffix: impl Into<String>, stale_after: Duration) -> Self {
        Self {
            lock_suffix: lock_suffix.into(),
            stale_after,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.lock_suffix.clone(), config.stale_lock_threshold())
    }

    /// Location of the lock marker guarding `path`
    pub fn lock_path_for(&self, path: &Path) -> PathBuf {
        let mut lock = path.as_os_str().to_owned();
        lock.push(&self.lock_suffix);
        PathBuf::from(lock)
    }

    /// Replaces the contents of `path` with `content`
    ///
    /// # Protocol
    ///
    /// 1. Create the parent directory if needed
    /// 2. Remove an existing lock older than the stale threshold, or give up
    ///    with [`WriteError::LockHeld`] if it is fresh
    /// 3. Create the lock exclusively
    /// 4. Write a temporary file in the target's directory and rename it
    ///    over the target
    /// 5. Remove the lock, whatever happened in step 4
    ///
    /// A failed write leaves the previous contents of `path` untouched.
    pub fn write(&self, path: &Path, content: &str) -> Result<(), WriteError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| WriteError::io(parent, e))?;

        let lock_path = self.lock_path_for(path);
        self.reclaim_stale_lock(path, &lock_path)?;

        let _lock = LockGuard::acquire(path, &lock_path)?;

        let mut staged = tempfile::Builder::new()
            .prefix(".nav_map_")
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|e| WriteError::io(parent, e))?;

        staged
            .write_all(content.as_bytes())
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| WriteError::io(staged.path(), e))?;

        staged
            .persist(path)
            .map_err(|e| WriteError::io(path, e.error))?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote file atomically");
        Ok(())
    }

    fn reclaim_stale_lock(&self, path: &Path, lock_path: &Path) -> Result<(), WriteError> {
        let metadata = match fs::metadata(lock_path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(WriteError::io(lock_path, e)),
        };

        // An mtime in the future counts as fresh
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or(Duration::ZERO);

        if age <= self.stale_after {
            tracing::warn!(
                lock = %lock_path.display(),
                age_secs = age.as_secs(),
                "Lock is held by another writer, skipping write"
            );
            return Err(WriteError::LockHeld {
                path: path.to_path_buf(),
            });
        }

        tracing::warn!(
            lock = %lock_path.display(),
            age_secs = age.as_secs(),
            "Removing stale lock"
        );
        match fs::remove_file(lock_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WriteError::io(lock_path, e)),
        }
    }
}

/// Exclusive lock marker, removed on drop
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(target: &Path, lock_path: &Path) -> Result<Self, WriteError> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(lock_path)
        {
            Ok(_) => Ok(Self {
                path: lock_path.to_path_buf(),
            }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(WriteError::LockHeld {
                path: target.to_path_buf(),
            }),
            Err(e) => Err(WriteError::io(lock_path, e)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::error!(lock = %self.path.display(), error = %e, "Failed to remove lock");
        }
    }
}
