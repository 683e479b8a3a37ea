//! Queue a raw JSON event from any source

use eyre::{Context, Result};
use serde::de::IgnoredAny;
use std::io::{self, Read};

use super::{flush, open_store};
use crate::config::Config;
use crate::queue::{EventFileStore, EventRecord, QueueEntry};

pub fn run(event: Option<&str>, no_flush: bool, config: &Config) -> Result<()> {
    let store = open_store(config)?;

    // Read event from stdin if not provided
    let event_str = match event {
        Some(e) => e.to_string(),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read event from stdin")?;
            buffer
        }
    };

    let entry = enqueue_raw(&store, &event_str)?;
    log::info!("Queued {}", entry.path.display());

    if no_flush {
        return Ok(());
    }

    flush::flush(&store, config)
}

/// Queue `event_str` verbatim once it is known to be well-formed JSON
///
/// Shape is the API's business.
fn enqueue_raw(store: &EventFileStore, event_str: &str) -> Result<QueueEntry> {
    serde_json::from_str::<IgnoredAny>(event_str).context("Failed to parse event JSON")?;
    store.enqueue(&EventRecord::new(event_str))
}
