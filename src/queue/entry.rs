//! Event records and their on-disk identity

use eyre::{Context, Result};
use lazy_regex::regex_captures;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix shared by every queue entry file name
pub const ENTRY_PREFIX: &str = "pd_";

/// Sortable identity of a queued event
///
/// Ordering is by creation time first; `origin_pid` and `seq` only break
/// ties so that the order is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntryId {
    pub created_at: u64,
    pub origin_pid: u32,
    /// Disambiguates entries enqueued by one process within the same second
    pub seq: u32,
}

impl EntryId {
    pub fn new(created_at: u64, origin_pid: u32) -> Self {
        Self {
            created_at,
            origin_pid,
            seq: 0,
        }
    }

    /// The same identity with the next collision sequence number
    pub fn next_seq(self) -> Self {
        Self {
            seq: self.seq + 1,
            ..self
        }
    }

    pub fn file_name(&self) -> String {
        if self.seq == 0 {
            format!("{}{}_{}", ENTRY_PREFIX, self.created_at, self.origin_pid)
        } else {
            format!("{}{}_{}_{}", ENTRY_PREFIX, self.created_at, self.origin_pid, self.seq)
        }
    }

    /// Parse a queue file name; anything that is not an entry yields `None`
    pub fn parse(file_name: &str) -> Option<Self> {
        let (_, created_at, origin_pid, seq) = regex_captures!(r"^pd_(\d+)_(\d+)(?:_(\d+))?$", file_name)?;

        let seq = if seq.is_empty() { 0 } else { seq.parse().ok()? };

        Some(Self {
            created_at: created_at.parse().ok()?,
            origin_pid: origin_pid.parse().ok()?,
            seq,
        })
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// One outbound event plus the metadata used to queue it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Serialized event; never inspected by the queue
    pub payload: String,
    pub created_at: u64,
    pub origin_pid: u32,
}

impl EventRecord {
    /// Stamp a payload with the current time and this process's id
    pub fn new(payload: impl Into<String>) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            payload: payload.into(),
            created_at,
            origin_pid: std::process::id(),
        }
    }

    /// Serialize a structured event to JSON and stamp it
    pub fn from_event<T: Serialize>(event: &T) -> Result<Self> {
        let payload = serde_json::to_string(event).context("Failed to serialize event")?;
        Ok(Self::new(payload))
    }

    /// A record with an explicit identity
    #[cfg(test)]
    pub fn at(payload: impl Into<String>, created_at: u64, origin_pid: u32) -> Self {
        Self {
            payload: payload.into(),
            created_at,
            origin_pid,
        }
    }

    pub fn id(&self) -> EntryId {
        EntryId::new(self.created_at, self.origin_pid)
    }
}

/// A persisted event file in the queue directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: EntryId,
    pub path: PathBuf,
}

impl QueueEntry {
    pub fn file_name(&self) -> String {
        self.id.file_name()
    }
}
