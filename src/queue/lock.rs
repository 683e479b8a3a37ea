//! Advisory lock over the queue directory
//!
//! Held for the duration of one flush (or purge) pass. The lock lives on
//! the open file description of the lock marker, so it is released when
//! the guard is dropped or the process exits.

use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug)]
pub struct QueueLock {
    file: File,
}

impl QueueLock {
    /// Try to take the exclusive lock without blocking
    ///
    /// Returns `Ok(None)` when another pass already holds it. Other I/O
    /// failures (e.g. the marker cannot be opened) are errors.
    pub fn try_acquire(lock_path: &Path) -> Result<Option<Self>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to lock {}", lock_path.display())),
        }
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::WouldBlock || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Drop for QueueLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
