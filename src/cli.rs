use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "pdrelay",
    about = "Queue monitoring events on disk and relay them to PagerDuty",
    version = env!("GIT_DESCRIBE"),
    after_help = "Without a subcommand, pdrelay flushes the queue.\n\nLogs are written to: ~/.local/share/pdrelay/logs/pdrelay.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to pdrelay.yaml config file")]
    pub config: Option<PathBuf>,

    /// Override the queue directory
    #[arg(long, global = true, value_name = "DIR")]
    pub queue_dir: Option<PathBuf>,

    /// Override the events API endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deliver every queued event
    Flush,

    /// Queue an alert from Zabbix, then flush
    Zabbix {
        /// PagerDuty service key
        service_key: String,

        /// Message subject: trigger or resolve
        subject: String,

        /// Message body of key:value lines
        body: String,
    },

    /// Queue a ready-made JSON event, then flush
    Enqueue {
        /// Event JSON (read from stdin if omitted)
        event: Option<String>,

        /// Only queue the event, do not flush
        #[arg(long)]
        no_flush: bool,
    },

    /// List pending events in delivery order
    Status {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Remove pending events without delivering them
    Purge {
        /// Only remove events queued more than this many hours ago
        #[arg(long, value_name = "HOURS")]
        older_than: Option<u64>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_flush() {
        let cli = Cli::try_parse_from(["pdrelay"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_zabbix_positional_args() {
        let cli = Cli::try_parse_from(["pdrelay", "zabbix", "svc", "trigger", "id:1"]).unwrap();
        match cli.command {
            Some(Commands::Zabbix {
                service_key,
                subject,
                body,
            }) => {
                assert_eq!(service_key, "svc");
                assert_eq!(subject, "trigger");
                assert_eq!(body, "id:1");
            }
            _ => panic!("expected zabbix command"),
        }
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from(["pdrelay", "status", "--queue-dir", "/q", "--endpoint", "http://x"]).unwrap();
        assert_eq!(cli.queue_dir, Some(PathBuf::from("/q")));
        assert_eq!(cli.endpoint.as_deref(), Some("http://x"));
    }
}
