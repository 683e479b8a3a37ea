//! Operator purge of undeliverable events

use colored::*;
use eyre::Result;
use std::time::{SystemTime, UNIX_EPOCH};

use super::open_store;
use crate::config::Config;
use crate::queue::{EventFileStore, QueueLock};

pub fn run(older_than: Option<u64>, config: &Config) -> Result<()> {
    let store = open_store(config)?;

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let removed = purge(&store, cutoff(now, older_than))?;
    println!("{} Purged {} event(s) from {}", "✓".green(), removed, store.dir().display());
    Ok(())
}

/// Creation-time cutoff for entries older than `older_than` hours
fn cutoff(now: u64, older_than: Option<u64>) -> Option<u64> {
    older_than.map(|hours| now.saturating_sub(hours.saturating_mul(3600)))
}

/// Remove pending entries created at or before `cutoff` (all if `None`)
///
/// Takes the flush lock so a purge never races a delivery pass.
fn purge(store: &EventFileStore, cutoff: Option<u64>) -> Result<usize> {
    let Some(_lock) = QueueLock::try_acquire(&store.lock_path())? else {
        eyre::bail!("A flush is in progress on {}, try again later", store.dir().display());
    };

    let mut removed = 0;
    for entry in store.list_pending()? {
        if cutoff.is_some_and(|c| entry.id.created_at > c) {
            continue;
        }
        store.remove(&entry)?;
        log::warn!("Purged undelivered event {}", entry.path.display());
        removed += 1;
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::queue::EventRecord;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn store_with_entries(dir: &std::path::Path) -> EventFileStore {
        let store = EventFileStore::open(dir, Arc::new(MemoryLogger::new())).unwrap();
        store.enqueue(&EventRecord::at("old", 100, 1)).unwrap();
        store.enqueue(&EventRecord::at("edge", 200, 1)).unwrap();
        store.enqueue(&EventRecord::at("new", 300, 1)).unwrap();
        store
    }

    #[test]
    fn test_purge_all() {
        let temp = tempdir().unwrap();
        let store = store_with_entries(temp.path());

        assert_eq!(purge(&store, None).unwrap(), 3);
        assert!(store.list_pending().unwrap().is_empty());
        assert!(store.lock_path().exists());
    }

    #[test]
    fn test_purge_respects_cutoff() {
        let temp = tempdir().unwrap();
        let store = store_with_entries(temp.path());

        assert_eq!(purge(&store, Some(200)).unwrap(), 2);

        let left: Vec<u64> = store
            .list_pending()
            .unwrap()
            .iter()
            .map(|e| e.id.created_at)
            .collect();
        assert_eq!(left, vec![300]);
    }

    #[test]
    fn test_cutoff_clamps_huge_age() {
        assert_eq!(cutoff(1000, None), None);
        assert_eq!(cutoff(7200, Some(1)), Some(3600));
        assert_eq!(cutoff(1_700_000_000, Some(u64::MAX / 1000)), Some(0));
        assert_eq!(cutoff(1_700_000_000, Some(u64::MAX)), Some(0));
    }

    #[test]
    fn test_purge_with_huge_age_keeps_everything() {
        let temp = tempdir().unwrap();
        let store = store_with_entries(temp.path());

        let removed = purge(&store, cutoff(1_700_000_000, Some(u64::MAX / 1000))).unwrap();

        assert_eq!(removed, 0);
        assert_eq!(store.list_pending().unwrap().len(), 3);
    }

    #[test]
    fn test_purge_refuses_during_flush() {
        let temp = tempdir().unwrap();
        let store = store_with_entries(temp.path());

        let _held = QueueLock::try_acquire(&store.lock_path()).unwrap().unwrap();

        assert!(purge(&store, None).is_err());
        assert_eq!(store.list_pending().unwrap().len(), 3);
    }
}
