//! Zabbix alert script entry point

use eyre::Result;

use super::{flush, open_store};
use crate::adapter::ZabbixAlert;
use crate::config::Config;
use crate::queue::{EventFileStore, EventRecord};

pub fn run(service_key: &str, subject: &str, body: &str, config: &Config) -> Result<()> {
    let store = open_store(config)?;

    // A malformed alert must not keep older events from draining
    let queued = enqueue(&store, service_key, subject, body);
    if let Err(e) = &queued {
        log::error!("Failed to queue Zabbix alert: {:#}", e);
    }

    flush::flush(&store, config)?;
    queued
}

fn enqueue(store: &EventFileStore, service_key: &str, subject: &str, body: &str) -> Result<()> {
    let alert = ZabbixAlert::parse(service_key, subject, body)?;
    let event = alert.to_event()?;
    log::info!("Zabbix {} for incident {}", event.event_type, event.incident_key);

    store.enqueue(&EventRecord::from_event(&event)?)?;
    Ok(())
}
