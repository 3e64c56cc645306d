//! Run lock
//!
//! At most one run may operate on a working directory at a time. The lock
//! is an OS advisory lock on `.relnotes.lock`, so it disappears with the
//! process that holds it: a run that is killed or aborts leaves at most a
//! stale file behind, which the next run takes over. The file records the
//! owning run id and is removed when the guard drops.

use crate::pipeline::PipelineError;
use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the lock file inside the working directory
pub const LOCK_FILE: &str = ".relnotes.lock";

const ACQUIRE_ATTEMPTS: usize = 3;

/// Exclusive hold on a working directory
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    file: File,
}

impl RunLock {
    /// Acquires the lock for `run_id`
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RunInProgress`] if another run holds the lock
    /// and [`PipelineError::Io`] if the file cannot be created.
    pub fn acquire(dir: &Path, run_id: &str) -> Result<Self, PipelineError> {
        let path = dir.join(LOCK_FILE);

        for _ in 0..ACQUIRE_ATTEMPTS {
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)?;

            match file.try_lock() {
                Ok(()) => {}
                Err(TryLockError::WouldBlock) => {
                    return Err(PipelineError::RunInProgress(path.display().to_string()));
                }
                Err(TryLockError::Error(e)) => return Err(e.into()),
            }

            // the previous holder may have unlinked the file we opened
            if !is_same_file(&path, &file) {
                continue;
            }

            if file.metadata()?.len() > 0 {
                tracing::warn!(lock = %path.display(), "Taking over stale run lock");
            }
            file.set_len(0)?;
            writeln!(file, "{run_id}")?;
            tracing::debug!(lock = %path.display(), run_id, "Acquired run lock");
            return Ok(Self { path, file });
        }

        Err(PipelineError::RunInProgress(path.display().to_string()))
    }

    /// Path of the lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // unlink while still locked; the OS lock goes with the handle
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %e, "Failed to remove run lock");
        }
        if let Err(e) = self.file.unlock() {
            tracing::warn!(lock = %self.path.display(), error = %e, "Failed to release run lock");
        }
    }
}

#[cfg(unix)]
fn is_same_file(path: &Path, file: &File) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (std::fs::metadata(path), file.metadata()) {
        (Ok(on_disk), Ok(held)) => on_disk.dev() == held.dev() && on_disk.ino() == held.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(path: &Path, _file: &File) -> bool {
    path.exists()
}
