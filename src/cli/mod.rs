//! CLI module for the observatory client
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `watch` - Connect to a producer (or the synthetic generator) and print telemetry
//! - `mode` - Show or change the persisted synthetic-mode preference
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Watch the default producer at localhost:8000
//! observatory watch
//!
//! # Watch generated telemetry as a table
//! observatory watch --synthetic --table
//!
//! # Make synthetic mode the default for future runs
//! observatory mode set on
//! ```

pub mod completions;
pub mod config;
pub mod mode;
pub mod output;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;
pub use mode::{handle_mode_set, handle_mode_show};

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Observatory - live GPU and host telemetry
#[derive(Parser, Debug)]
#[command(
    name = "observatory",
    version,
    about = "Live GPU and host telemetry client"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream telemetry and print it
    Watch(WatchArgs),
    /// Show or change the persisted data source
    #[command(subcommand)]
    Mode(ModeCommands),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "observatory.toml")]
    pub config: PathBuf,

    /// Full producer URL (ws:// or wss://), overrides host and path
    #[arg(short, long)]
    pub url: Option<String>,

    /// Override producer host[:port]
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Use wss:// when building the endpoint from host
    #[arg(long)]
    pub secure: bool,

    /// Derive host and scheme from a dashboard origin (https:// selects wss://)
    #[arg(long, conflicts_with_all = ["host", "url"])]
    pub origin: Option<String>,

    /// Use generated telemetry for this run
    #[arg(long, conflicts_with = "live")]
    pub synthetic: bool,

    /// Use the live producer for this run
    #[arg(long)]
    pub live: bool,

    /// Print one JSON line per snapshot
    #[arg(long, conflicts_with = "table")]
    pub json: bool,

    /// Print the fleet table after every snapshot
    #[arg(long)]
    pub table: bool,

    /// Exit after this many snapshots
    #[arg(short = 'n', long)]
    pub count: Option<u64>,

    /// Override preferences file
    #[arg(long)]
    pub prefs: Option<PathBuf>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "OBSERVATORY_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ModeCommands {
    /// Print the data source the next `watch` would use
    Show(ModeShowArgs),
    /// Persist the synthetic-mode toggle
    Set(ModeSetArgs),
}

#[derive(Args, Debug)]
pub struct ModeShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "observatory.toml")]
    pub config: PathBuf,

    /// Override preferences file
    #[arg(long)]
    pub prefs: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ModeSetArgs {
    /// Synthetic mode on or off
    #[arg(value_enum)]
    pub synthetic: Toggle,

    /// Path to configuration file
    #[arg(short, long, default_value = "observatory.toml")]
    pub config: PathBuf,

    /// Override preferences file
    #[arg(long)]
    pub prefs: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "observatory.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
