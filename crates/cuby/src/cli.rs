//! Clap derive structures for the `cuby` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cuby -- control Cuby air conditioners from the command line
#[derive(Debug, Parser)]
#[command(
    name = "cuby",
    version,
    about = "Control Cuby cloud air conditioners from the command line",
    long_about = "Lists, inspects and controls the A/C units registered to a Cuby \
        cloud account.\n\n\
        Accounts live in named profiles (see `cuby config init`); passwords are \
        read from CUBY_PASSWORD, the system keyring, or the config file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "CUBY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Account username (overrides profile)
    #[arg(long, short = 'u', env = "CUBY_USERNAME", global = true)]
    pub username: Option<String>,

    /// API root (overrides profile)
    #[arg(long, env = "CUBY_BASE_URL", global = true, hide_env = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CUBY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(
        long,
        env = "CUBY_TIMEOUT",
        global = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and inspect A/C units
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Change a unit's power, setpoint or modes
    Set(SetArgs),

    /// Set up every entity and show one poll of all of them
    Status,

    /// Poll every entity on an interval until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List units on the account
    #[command(alias = "ls")]
    List,

    /// Show one unit from the account listing
    Get {
        /// Device ID
        device: String,
    },

    /// Show a unit's current state
    State {
        /// Device ID
        device: String,
    },

    /// Show a unit's details (signal strength, online flag)
    Info {
        /// Device ID
        device: String,
    },
}

// ── Set ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(subcommand)]
    pub command: SetCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PowerState {
    On,
    Off,
}

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Turn a unit on or off
    Power {
        /// Device ID
        device: String,
        #[arg(value_enum)]
        state: PowerState,
    },

    /// Set the target temperature (°C, clamped to 16-30)
    #[command(alias = "temperature")]
    Temp {
        /// Device ID
        device: String,
        #[arg(allow_negative_numbers = true)]
        celsius: f64,
    },

    /// Set the operating mode (auto, cool, heat, dry, fan_only)
    Mode {
        /// Device ID
        device: String,
        mode: String,
    },

    /// Set the fan speed (auto, low, medium, high)
    Fan {
        /// Device ID
        device: String,
        speed: String,
    },

    /// Set the swing direction (off, vertical, horizontal, both)
    Swing {
        /// Device ID
        device: String,
        direction: String,
    },

    /// Apply several fields at once from a JSON object
    State {
        /// Device ID
        device: String,
        /// e.g. '{"power": true, "mode": "cool", "temperature": 22}'
        json: String,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between polls
    #[arg(long, short = 'i', default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Stop after this many polls
    #[arg(long, short = 'n')]
    pub count: Option<u32>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Verify an account and write a profile (guided setup)
    Init,

    /// Display the current configuration (passwords redacted)
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
