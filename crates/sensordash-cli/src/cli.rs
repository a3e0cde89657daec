//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Remote store connection arguments
#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// Realtime database URL, e.g. https://my-node.firebaseio.com
    #[arg(long, global = true, env = "SENSORDASH_DB_URL")]
    pub url: Option<String>,

    /// Database auth token or secret
    #[arg(long, global = true, env = "SENSORDASH_DB_AUTH", hide_env_values = true)]
    pub auth: Option<String>,
}

#[derive(Parser)]
#[command(name = "sensordash")]
#[command(author, version, about = "Dashboard for a home environment sensor node", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Use a specific config file
    #[arg(long, global = true, env = "SENSORDASH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch and print sensor readings
    Read {
        /// Only print the most recent N readings
        #[arg(short = 'n', long)]
        last: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no pretty-printing)
        #[arg(long)]
        compact: bool,
    },

    /// Evaluate alert thresholds against the latest readings
    Check {
        /// Send a raised alert through every enabled channel
        #[arg(long)]
        dispatch: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export readings to a CSV file
    Export {
        /// Only export readings from this month (1-12)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=12))]
        month: Option<u8>,

        /// Output file (defaults to sensor_data.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change the sleep mode preference
    Sleep {
        #[command(subcommand)]
        action: SleepAction,
    },

    /// Run a voice command
    Voice {
        /// Interpret this phrase instead of listening
        phrase: Option<String>,
    },

    /// Poll continuously and raise alerts
    Watch(WatchOptions),

    /// Launch interactive terminal dashboard
    #[cfg(feature = "tui")]
    Dashboard,

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options for `watch`
#[derive(Debug, Clone, Args)]
pub struct WatchOptions {
    /// Poll interval in seconds (overrides config)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Print each alert as a JSON line
    #[arg(long)]
    pub json: bool,

    /// Do not send alerts, only log them
    #[arg(long)]
    pub no_dispatch: bool,
}

/// Sleep mode actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum SleepAction {
    /// Flip the value last reported by the sensor node
    Toggle,
    /// Enable sleep mode
    On,
    /// Disable sleep mode
    Off,
}

/// Config subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show configuration file path
    Path,

    /// Show current configuration
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file without asking
        #[arg(short, long)]
        force: bool,
    },
}
