use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

mod adapter;
mod cli;
mod commands;
mod config;
mod event;
mod logger;
mod queue;
mod submit;

use cli::{Cli, Commands};
use config::{Config, LogLevel};

fn default_log_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pdrelay")
        .join("logs")
        .join("pdrelay.log")
}

fn setup_logging(log_level: &LogLevel, log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    // RUST_LOG env var takes precedence, otherwise use config log_level
    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.as_filter());
    }

    let log_file = log_file.map(Path::to_path_buf).unwrap_or_else(default_log_file);

    if log_file.as_os_str() == "-" {
        builder.target(env_logger::Target::Stderr).init();
        info!("Logging initialized, writing to stderr");
        return Ok(());
    }

    if let Some(log_dir) = log_file.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run(command: Option<Commands>, config: Config) -> Result<()> {
    match command {
        None | Some(Commands::Flush) => commands::flush::run(&config),
        Some(Commands::Zabbix {
            service_key,
            subject,
            body,
        }) => commands::zabbix::run(&service_key, &subject, &body, &config),
        Some(Commands::Enqueue { event, no_flush }) => commands::enqueue::run(event.as_deref(), no_flush, &config),
        Some(Commands::Status { format }) => commands::status::run(cli::OutputFormat::resolve(format), &config),
        Some(Commands::Purge { older_than }) => commands::purge::run(older_than, &config),
        Some(Commands::Completions { shell }) => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Load configuration (before logging, so log messages in Config::load are silent)
    let config = Config::load(cli.config.as_ref())
        .context("Failed to load configuration")?
        .with_overrides(cli.queue_dir, cli.endpoint);

    setup_logging(&config.log_level, config.log_file.as_deref()).context("Failed to setup logging")?;

    info!("Starting pdrelay with queue at {}", config.queue_dir().display());

    run(cli.command, config).context("Command failed")?;

    Ok(())
}
