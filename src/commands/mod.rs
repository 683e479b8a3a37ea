pub mod completions;
pub mod enqueue;
pub mod flush;
pub mod purge;
pub mod status;
pub mod zabbix;

use eyre::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::logger::ProcessLogger;
use crate::queue::EventFileStore;

/// Open (and if needed create) the configured queue directory
pub fn open_store(config: &Config) -> Result<EventFileStore> {
    let dir = config.queue_dir();
    EventFileStore::open(&dir, Arc::new(ProcessLogger))
        .with_context(|| format!("Queue directory {} is unusable", dir.display()))
}
