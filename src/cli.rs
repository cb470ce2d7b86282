use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::event::{Domain, EventKind};

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
    name = "klaviyo-events",
    about = "Send restaurant ordering, reservation and loyalty events to Klaviyo",
    version = env!("GIT_DESCRIBE"),
    after_help = "The private API key is read from KLAVIYO_API_KEY.\nLogs are written to: ~/.local/share/klaviyo-events/logs/klaviyo-events.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config.yaml")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one event
    Send(SendArgs),

    /// List the event catalog
    Kinds {
        /// Only show kinds from this domain
        #[arg(long, short = 'd', value_enum)]
        domain: Option<Domain>,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Send the sample events of one or all domains
    Demo {
        /// Only send samples from this domain
        #[arg(long, short = 'd', value_enum)]
        domain: Option<Domain>,

        #[command(flatten)]
        profile: ProfileArgs,

        /// Number of events to send concurrently
        #[arg(long, short = 'j', default_value = "1")]
        jobs: usize,

        /// Print payloads instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Diagnose setup issues
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Who the event is attributed to
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Customer email (profile join key)
    #[arg(long, short = 'e')]
    pub email: String,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    /// Phone number, ideally E.164
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Event kind, e.g. placed-order
    #[arg(value_enum)]
    pub kind: EventKind,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// When the event happened (RFC 3339, defaults to now)
    #[arg(long, short = 't', value_parser = parse_time)]
    pub time: Option<DateTime<Utc>>,

    /// Event property; VALUE is parsed as JSON, otherwise taken as a string
    #[arg(long = "prop", short = 'p', value_name = "KEY=VALUE")]
    pub props: Vec<String>,

    /// JSON object file with event properties (--prop entries override it)
    #[arg(long, value_name = "PATH")]
    pub properties_file: Option<PathBuf>,

    /// Custom profile property; VALUE is parsed like --prop
    #[arg(long = "profile-prop", value_name = "KEY=VALUE")]
    pub profile_props: Vec<String>,

    /// Monetary value (order events only)
    #[arg(long)]
    pub value: Option<f64>,

    /// ISO 4217 currency code (defaults to the configured currency when --value is set)
    #[arg(long)]
    pub currency: Option<String>,

    /// Print the payload instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a configuration value
    Get {
        /// Key to get (e.g. api.revision)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Key to set
        key: String,

        /// Value to set
        value: String,
    },
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp like 2025-06-30T14:30:00Z: {}", e))
}
