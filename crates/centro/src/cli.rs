//! Clap derive structures for the `centro` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// centro -- monitor and control a Centrometal pellet boiler
#[derive(Debug, Parser)]
#[command(
    name = "centro",
    version,
    about = "Monitor and control Centrometal pellet boilers",
    long_about = "Bridges a Centrometal pellet boiler to the command line.\n\n\
        Live values arrive over the biotec telemetry broker; the web portal\n\
        supplies full status pulls and accepts control commands.",
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
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOpts {
    /// Path to the config file (defaults to the platform config dir)
    #[arg(long, env = "CENTRO_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates from the portal
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Portal request timeout in seconds (overrides the config file)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not subscribe to the telemetry broker
    #[arg(long, global = true)]
    pub no_telemetry: bool,
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stay connected and print readings whenever they change
    #[command(alias = "watch")]
    Run(RunArgs),

    /// Connect once and print every point
    #[command(alias = "st")]
    Status(StatusArgs),

    /// List the known points (no connection needed)
    #[command(alias = "ls")]
    Points(PointsArgs),

    /// Write a setpoint (e.g. `centro set pwr10 70`)
    Set(SetArgs),

    /// Turn a switch on or off
    Switch(SwitchArgs),

    /// Turn boiler heating on or off
    Heating(HeatingArgs),

    /// Verify portal credentials
    Login,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Connected commands ───────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Print only the points whose reading changed since the last update
    #[arg(long)]
    pub changes_only: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Show only these points (point id or field key)
    pub points: Vec<String>,

    /// Hide points that have no reading yet
    #[arg(long)]
    pub known: bool,
}

#[derive(Debug, Args)]
pub struct PointsArgs {
    /// Only list points of this kind
    #[arg(long)]
    pub kind: Option<PointFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PointFilter {
    Sensors,
    Numbers,
    Switches,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Setpoint id, command or state key (e.g. `pwr10`, `PWR 10`, `PVAL_10_0`)
    pub point: String,

    /// New value
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
}

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Switch id, command or state key (e.g. `pwr129`)
    pub point: String,

    pub state: OnOff,
}

#[derive(Debug, Args)]
pub struct HeatingArgs {
    pub state: OnOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnOff {
    On,
    Off,
}

impl OnOff {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the resolved configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// Store the portal password in the system keyring
    SetPassword {
        /// Account email (defaults to `portal.email` from the config)
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
