//! Clap derive structures for the `lanesync` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lanesync -- status and control for multi-lane filament changers
#[derive(Debug, Parser)]
#[command(
    name = "lanesync",
    version,
    about = "Inspect and drive a Klipper multi-lane filament changer",
    long_about = "Talks to the printer host's HTTP API to list lanes and their\n\
        derived status, stream presentation updates while polling, and send\n\
        lane commands (tool changes, spool metadata, maintenance moves).",
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
    /// Printer profile to use
    #[arg(long, short = 'p', env = "LANESYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Printer API URL (overrides profile)
    #[arg(long, env = "LANESYNC_PRINTER", global = true)]
    pub printer: Option<String>,

    /// API key sent as X-Api-Key
    #[arg(long, env = "LANESYNC_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LANESYNC_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LANESYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "LANESYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every lane with its derived status
    #[command(alias = "ls")]
    Lanes,

    /// Inspect or drive a single lane
    #[command(alias = "l")]
    Lane(LaneArgs),

    /// Show the currently loaded lane and its sensor reading
    #[command(alias = "sum")]
    Summary,

    /// Poll the printer and log presentation updates until Ctrl-C
    Watch(WatchArgs),

    /// Turn the unit LEDs on or off
    Led {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Enable or disable the virtual bypass sensor
    Bypass {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Run the unit calibration routine
    Calibrate,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Lane ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LaneArgs {
    #[command(subcommand)]
    pub command: LaneCommand,
}

#[derive(Debug, Subcommand)]
pub enum LaneCommand {
    /// Show one lane in detail
    #[command(alias = "get")]
    Show { lane: String },

    /// Load the lane into the toolhead
    Load { lane: String },

    /// Unload whatever is in the toolhead
    Unload,

    /// Eject the lane back to its spool
    Eject { lane: String },

    /// Mark the lane as loaded without moving filament
    SetLoaded { lane: String },

    /// Clear the loaded-lane marker
    UnsetLoaded,

    /// Assign a tool mapping (e.g. T3)
    SetMap { lane: String, map: String },

    /// Set the runout fallback lane (NONE clears it)
    SetRunout { lane: String, runout: String },

    /// Set the filament material
    SetMaterial { lane: String, material: String },

    /// Set the filament color (hex, with or without '#')
    SetColor { lane: String, color: String },

    /// Set the remaining filament weight in grams
    SetWeight { lane: String, weight: u32 },

    /// Attach a spool record, or detach with no id
    SetSpool { lane: String, spool_id: Option<u32> },

    /// Move filament by DISTANCE mm (negative retracts)
    Move {
        lane: String,
        #[arg(allow_hyphen_values = true)]
        distance: f64,
    },

    /// Run the lane self-test
    Test { lane: String },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Snapshot poll period in milliseconds (overrides profile)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Sensor poll period in seconds (0 disables)
    #[arg(long)]
    pub sensor_interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration (secrets masked)
    Show,

    /// Create or update a profile interactively
    Init,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
