//! Flush pass: drain the queue through a submitter
//!
//! At most one pass runs against a queue directory at a time. A pass that
//! finds the lock taken returns immediately and leaves the queue alone.
//! Inside a pass each entry is decided independently, oldest first:
//!
//! - accepted: removed, incident key logged
//! - rejected: removed, reason logged as a warning
//! - deferred: kept for the next pass, reason logged as a warning

use std::sync::Arc;
use std::time::Duration;

use super::entry::{EntryId, QueueEntry};
use super::lock::QueueLock;
use super::store::EventFileStore;
use crate::logger::Logger;
use crate::submit::{SubmitOutcome, Submitter};

/// What happened to one entry during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryDisposition {
    Delivered { incident_key: String },
    Discarded { reason: String },
    Retained { reason: String },
    /// The payload could not be read; the file is left in place
    Unreadable { reason: String },
}

impl EntryDisposition {
    /// Whether the entry was meant to leave the queue
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered { .. } | Self::Discarded { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Delivered { incident_key } => format!("delivered (incident {})", incident_key),
            Self::Discarded { reason } => format!("discarded: {}", reason),
            Self::Retained { reason } => format!("retained: {}", reason),
            Self::Unreadable { reason } => format!("unreadable: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    pub id: EntryId,
    pub disposition: EntryDisposition,
    /// False when the entry should have been deleted but deletion failed
    pub removed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub entries: Vec<EntryReport>,
}

impl FlushReport {
    pub fn delivered(&self) -> usize {
        self.count(|d| matches!(d, EntryDisposition::Delivered { .. }))
    }

    pub fn discarded(&self) -> usize {
        self.count(|d| matches!(d, EntryDisposition::Discarded { .. }))
    }

    pub fn retained(&self) -> usize {
        self.count(|d| matches!(d, EntryDisposition::Retained { .. } | EntryDisposition::Unreadable { .. }))
    }

    fn count(&self, pred: impl Fn(&EntryDisposition) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.disposition)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushStatus {
    /// Another pass holds the lock; nothing was touched
    Skipped,
    Completed(FlushReport),
}

/// Temporary files older than this belong to an enqueue that died
const STALE_INCOMING_AGE: Duration = Duration::from_secs(3600);

pub struct QueueFlusher<'a> {
    store: &'a EventFileStore,
    submitter: &'a dyn Submitter,
    logger: Arc<dyn Logger>,
}

impl<'a> QueueFlusher<'a> {
    pub fn new(store: &'a EventFileStore, submitter: &'a dyn Submitter) -> Self {
        Self {
            store,
            submitter,
            logger: store.logger(),
        }
    }

    /// Take the queue lock and run one pass
    ///
    /// Lock contention is not an error. Errors are only returned when the
    /// lock marker cannot be opened or the queue cannot be listed.
    pub fn lock_and_flush(&self) -> eyre::Result<FlushStatus> {
        self.logger.info("Acquiring lock on queue");

        let lock = match QueueLock::try_acquire(&self.store.lock_path()) {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                self.logger
                    .warn("Queue is locked by another flush in progress, skipping this pass");
                return Ok(FlushStatus::Skipped);
            }
            Err(e) => {
                self.logger
                    .error(&format!("Error while trying to acquire lock on queue: {:#}", e));
                return Err(e);
            }
        };

        let result = self.flush();

        self.logger.info("Releasing lock on queue");
        drop(lock);

        result.map(FlushStatus::Completed)
    }

    fn flush(&self) -> eyre::Result<FlushReport> {
        let pending = self.store.list_pending()?;
        self.store.sweep_incoming(STALE_INCOMING_AGE);

        let mut report = FlushReport::default();

        for entry in &pending {
            report.entries.push(self.process(entry));
        }

        Ok(report)
    }

    fn process(&self, entry: &QueueEntry) -> EntryReport {
        let path = entry.path.display();

        let payload = match self.store.read(entry) {
            Ok(payload) => payload,
            Err(e) => {
                self.logger.error(&format!("Skipping unreadable event file {}: {:#}", path, e));
                return EntryReport {
                    id: entry.id,
                    disposition: EntryDisposition::Unreadable {
                        reason: format!("{:#}", e),
                    },
                    removed: false,
                };
            }
        };

        let disposition = match self.submitter.submit(&payload) {
            SubmitOutcome::Accepted { incident_key } => {
                self.logger
                    .info(&format!("PagerDuty event submitted with incident key: {}", incident_key));
                EntryDisposition::Delivered { incident_key }
            }
            SubmitOutcome::Rejected { reason } => {
                self.logger.warn(&format!(
                    "PagerDuty server REJECTED the event in file: {}, Reason: {}",
                    path, reason
                ));
                EntryDisposition::Discarded { reason }
            }
            SubmitOutcome::Deferred { reason } => {
                self.logger
                    .warn(&format!("DEFERRED PagerDuty event in file: {}, Reason: {}", path, reason));
                return EntryReport {
                    id: entry.id,
                    disposition: EntryDisposition::Retained { reason },
                    removed: false,
                };
            }
        };

        let removed = match self.store.remove(entry) {
            Ok(()) => true,
            Err(e) => {
                self.logger.error(&format!("{:#}", e));
                false
            }
        };

        EntryReport {
            id: entry.id,
            disposition,
            removed,
        }
    }
}
