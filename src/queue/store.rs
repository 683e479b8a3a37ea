//! Directory-backed event file store
//!
//! Layout:
//!
//! ```text
//! <queue_dir>/            (mode 0700)
//! ├─ lockfile             # advisory lock marker for flush passes
//! ├─ pd_<ts>_<pid>        # one queued event per file (mode 0600)
//! └─ pd_<ts>_<pid>_<seq>  # same-second collision from one process
//! ```
//!
//! Entries are written to a hidden temporary file first and then linked
//! to their final name, so a flusher never sees a partially written entry.

use eyre::{Context, Result};
use std::fs::{self, DirBuilder, File};
use std::io::{self, ErrorKind, Write};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::entry::{EntryId, EventRecord, QueueEntry};
use crate::logger::Logger;

/// Name of the lock marker inside the queue directory
pub const LOCK_FILE: &str = "lockfile";

/// Prefix for in-flight temporary files; never matches an entry name
const INCOMING_PREFIX: &str = ".incoming-";

/// Upper bound on collision retries for a single enqueue
const MAX_NAME_ATTEMPTS: u32 = 1024;

pub struct EventFileStore {
    dir: PathBuf,
    logger: Arc<dyn Logger>,
}

impl EventFileStore {
    /// Open the queue directory, creating it if needed
    ///
    /// Fails if the directory cannot be created, is not a directory, or is
    /// not both listable and writable by the current user.
    pub fn open(dir: impl Into<PathBuf>, logger: Arc<dyn Logger>) -> Result<Self> {
        let dir = dir.into();
        let store = Self { dir, logger };

        if let Err(e) = store.prepare() {
            store.logger.error(&format!("{:#}", e));
            return Err(e);
        }

        Ok(store)
    }

    fn prepare(&self) -> Result<()> {
        if !self.dir.exists() {
            DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(&self.dir)
                .with_context(|| format!("Failed to create queue directory {}", self.dir.display()))?;
        }

        if !self.dir.is_dir() {
            eyre::bail!("Queue path {} is not a directory", self.dir.display());
        }

        fs::read_dir(&self.dir).with_context(|| {
            format!(
                "Can't read directory {}, please check permissions",
                self.dir.display()
            )
        })?;

        tempfile::tempfile_in(&self.dir).with_context(|| {
            format!(
                "Can't write to directory {}, please check permissions",
                self.dir.display()
            )
        })?;

        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.logger)
    }

    /// Persist a record as a new entry file
    ///
    /// Never overwrites an existing entry: if the name derived from
    /// `(created_at, origin_pid)` is taken, a sequence suffix is appended.
    pub fn enqueue(&self, record: &EventRecord) -> Result<QueueEntry> {
        let mut incoming = tempfile::Builder::new()
            .prefix(INCOMING_PREFIX)
            .tempfile_in(&self.dir)
            .with_context(|| format!("Failed to create temporary file in {}", self.dir.display()))?;

        incoming
            .write_all(record.payload.as_bytes())
            .context("Failed to write event payload")?;
        incoming.as_file().sync_all().context("Failed to sync event payload")?;

        let mut id = record.id();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(id.file_name());
            match incoming.persist_noclobber(&path) {
                Ok(_) => {
                    self.sync_dir();
                    self.logger.info(&format!("Queuing event {} as {}", record.payload, id));
                    return Ok(QueueEntry { id, path });
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    incoming = e.file;
                    id = id.next_seq();
                }
                Err(e) => {
                    return Err(e.error).with_context(|| format!("Failed to publish queue entry {}", path.display()));
                }
            }
        }

        eyre::bail!(
            "Gave up naming queue entry for {} after {} attempts",
            record.id(),
            MAX_NAME_ATTEMPTS
        )
    }

    /// Snapshot of pending entries, oldest first
    ///
    /// Only files whose names parse as an [`EntryId`] are returned; the
    /// lock marker, temporary files, and anything foreign are skipped. A
    /// directory entry that cannot be read is logged and skipped.
    pub fn list_pending(&self) -> Result<Vec<QueueEntry>> {
        let read_dir =
            fs::read_dir(&self.dir).with_context(|| format!("Failed to list queue directory {}", self.dir.display()))?;

        let listing = read_dir.map(|dir_entry| {
            dir_entry.map(|d| {
                let is_file = d.file_type().map(|t| t.is_file()).unwrap_or(false);
                (d.file_name().to_string_lossy().to_string(), d.path(), is_file)
            })
        });

        Ok(self.collect_pending(listing))
    }

    fn collect_pending(&self, listing: impl Iterator<Item = io::Result<(String, PathBuf, bool)>>) -> Vec<QueueEntry> {
        let mut entries = Vec::new();

        for item in listing {
            let (name, path, is_file) = match item {
                Ok(item) => item,
                Err(e) => {
                    self.logger.error(&format!(
                        "Skipping unreadable entry in queue directory {}: {}",
                        self.dir.display(),
                        e
                    ));
                    continue;
                }
            };

            if is_file && let Some(id) = EntryId::parse(&name) {
                entries.push(QueueEntry { id, path });
            }
        }

        entries.sort_by_key(|entry| entry.id);
        entries
    }

    /// Delete temporary files left behind by enqueues that never finished
    ///
    /// Only files older than `max_age` are touched, so an enqueue still in
    /// progress keeps its file. Call with the queue lock held.
    pub fn sweep_incoming(&self, max_age: Duration) -> usize {
        let Ok(read_dir) = fs::read_dir(&self.dir) else {
            return 0;
        };

        let mut swept = 0;
        for dir_entry in read_dir.flatten() {
            let name = dir_entry.file_name();
            if !name.to_string_lossy().starts_with(INCOMING_PREFIX) {
                continue;
            }

            let age = dir_entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| SystemTime::now().duration_since(modified).ok());
            if !age.is_some_and(|age| age >= max_age) {
                continue;
            }

            match fs::remove_file(dir_entry.path()) {
                Ok(()) => {
                    self.logger
                        .warn(&format!("Removed abandoned temporary file {}", dir_entry.path().display()));
                    swept += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    self.logger.error(&format!(
                        "Failed to remove abandoned temporary file {}: {}",
                        dir_entry.path().display(),
                        e
                    ));
                }
            }
        }

        swept
    }

    /// Read an entry's payload
    pub fn read(&self, entry: &QueueEntry) -> Result<String> {
        fs::read_to_string(&entry.path).with_context(|| format!("Failed to read queue entry {}", entry.path.display()))
    }

    /// Delete an entry; an already absent file counts as removed
    pub fn remove(&self, entry: &QueueEntry) -> Result<()> {
        match fs::remove_file(&entry.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove queue entry {}", entry.path.display())),
        }
    }

    /// Make the rename durable; failure here does not undo the enqueue
    fn sync_dir(&self) {
        if let Err(e) = File::open(&self.dir).and_then(|d| d.sync_all()) {
            self.logger
                .warn(&format!("Failed to sync queue directory {}: {}", self.dir.display(), e));
        }
    }
}
