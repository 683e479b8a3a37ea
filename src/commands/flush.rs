//! Flush the queue to PagerDuty

use eyre::Result;

use super::open_store;
use crate::config::Config;
use crate::queue::{EventFileStore, FlushStatus, QueueFlusher};
use crate::submit::PagerDutyClient;

pub fn run(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    flush(&store, config)
}

/// Run one flush pass against an already opened store
pub fn flush(store: &EventFileStore, config: &Config) -> Result<()> {
    let client = PagerDutyClient::new(&config.api.endpoint, config.api.timeout());
    log::debug!("Flushing {} to {}", store.dir().display(), client.endpoint());

    match QueueFlusher::new(store, &client).lock_and_flush()? {
        FlushStatus::Skipped => {
            log::info!("Flush skipped, another pass owns the queue");
        }
        FlushStatus::Completed(report) => {
            for entry in &report.entries {
                log::debug!("{}: {}", entry.id, entry.disposition.describe());
                if entry.disposition.is_terminal() && !entry.removed {
                    log::warn!("{} is finished but still on disk; it will be submitted again", entry.id);
                }
            }
            log::info!(
                "Flush complete: {} delivered, {} discarded, {} retained",
                report.delivered(),
                report.discarded(),
                report.retained()
            );
        }
    }

    Ok(())
}
