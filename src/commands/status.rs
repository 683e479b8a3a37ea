//! Queue status command
//!
//! Lists pending events in the order the next flush will submit them.
//! Payloads are never printed; they may carry service keys.

use chrono::{DateTime, Local};
use colored::*;
use eyre::{Context, Result};
use serde::Serialize;
use std::fs;

use super::open_store;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::queue::{EventFileStore, QueueEntry};

#[derive(Serialize)]
struct QueueStatus {
    queue_dir: String,
    endpoint: String,
    pending: Vec<PendingStatus>,
}

#[derive(Serialize)]
struct PendingStatus {
    file: String,
    queued_at: String,
    origin_pid: u32,
    bytes: u64,
}

impl PendingStatus {
    fn from_entry(entry: &QueueEntry) -> Self {
        let queued_at = DateTime::from_timestamp(entry.id.created_at as i64, 0)
            .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.id.created_at.to_string());

        Self {
            file: entry.file_name(),
            queued_at,
            origin_pid: entry.id.origin_pid,
            bytes: fs::metadata(&entry.path).map(|m| m.len()).unwrap_or(0),
        }
    }
}

pub fn run(format: OutputFormat, config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let status = collect(&store, config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&status)?),
        OutputFormat::Text => print_text(&status),
    }

    Ok(())
}

fn collect(store: &EventFileStore, config: &Config) -> Result<QueueStatus> {
    let pending = store.list_pending().context("Failed to list pending events")?;

    Ok(QueueStatus {
        queue_dir: store.dir().display().to_string(),
        endpoint: config.api.endpoint.clone(),
        pending: pending.iter().map(PendingStatus::from_entry).collect(),
    })
}

fn print_text(status: &QueueStatus) {
    println!("{}", "PagerDuty relay queue".bold());
    println!("{}", "═".repeat(50));
    println!("  Directory: {}", status.queue_dir.cyan());
    println!("  Endpoint:  {}", status.endpoint.dimmed());
    println!();

    if status.pending.is_empty() {
        println!("{} Queue is empty", "✓".green());
        return;
    }

    println!("{} {} pending event(s):", "⚠".yellow(), status.pending.len());
    for p in &status.pending {
        println!(
            "  {}  {}  pid {}  {} bytes",
            p.queued_at.dimmed(),
            p.file.bold(),
            p.origin_pid,
            p.bytes
        );
    }
}
