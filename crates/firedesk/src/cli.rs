//! Clap derive structures for the `firedesk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// firedesk -- dispatcher console for fire alarm monitoring
#[derive(Debug, Parser)]
#[command(
    name = "firedesk",
    version,
    about = "Inspect fire alarm monitoring data from the command line",
    long_about = "Read-only access to the monitoring service database: objects,\n\
        active alarms and the event log, with the same status and color\n\
        classification the dispatcher console uses.",
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
    /// Use the built-in demo data instead of a database
    #[arg(long, env = "FIREDESK_DEMO", global = true)]
    pub demo: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "FIREDESK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Database host (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Database file path on the server (overrides config)
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FIREDESK_OUTPUT",
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
    /// List and inspect monitored objects
    #[command(alias = "obj", alias = "o")]
    Objects(ObjectsArgs),

    /// Show currently active alarms
    #[command(alias = "a")]
    Alarms(AlarmsArgs),

    /// Read the event log
    #[command(alias = "ev", alias = "e")]
    Events(EventsArgs),

    /// Show and edit severity colors
    Colors(ColorsArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Objects ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ObjectsArgs {
    #[command(subcommand)]
    pub command: ObjectsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ObjectsCommand {
    /// List objects
    #[command(alias = "ls")]
    List {
        /// Case-insensitive search over number, name, address, contract and phones
        #[arg(long, short = 's')]
        search: Option<String>,

        /// Status filter
        #[arg(long, short = 'f', default_value = "all")]
        filter: ObjectFilterArg,
    },

    /// Show one object with zones, contacts and test data
    Show {
        /// Object number
        id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ObjectFilterArg {
    All,
    /// Fire or fault
    Alarms,
    /// Armed but no link
    Offline,
    Disarmed,
}

// ── Alarms ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AlarmsArgs {
    #[command(subcommand)]
    pub command: AlarmsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlarmsCommand {
    /// List active alarms
    #[command(alias = "ls")]
    List {
        /// Only unprocessed fire alarms
        #[arg(long)]
        fire: bool,
    },
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// Show the newest events, optionally following new ones
    Tail {
        /// Number of recent events to show first
        #[arg(long, short = 'n', default_value = "50")]
        limit: usize,

        /// Keep polling and print new events as they arrive
        #[arg(long, short = 'f')]
        follow: bool,

        /// Only fire, fault and link-loss events
        #[arg(long, short = 'i')]
        important: bool,

        /// Only events of this object
        #[arg(long)]
        object: Option<String>,

        /// Time window
        #[arg(long, default_value = "all")]
        period: PeriodArg,

        /// Poll period in seconds when following
        #[arg(long, default_value = "2")]
        interval: u64,
    },

    /// Recent events of one object
    Object {
        /// Object number
        id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodArg {
    Hour,
    Today,
    All,
}

// ── Colors ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ColorsArgs {
    #[command(subcommand)]
    pub command: ColorsCommand,
}

/// Theme selection shared by the color commands.
#[derive(Debug, Args)]
#[group(multiple = false)]
pub struct ThemeArg {
    /// Dark theme table
    #[arg(long)]
    pub dark: bool,

    /// Light theme table
    #[arg(long)]
    pub light: bool,
}

#[derive(Debug, Subcommand)]
pub enum ColorsCommand {
    /// Show the severity table of a theme (default: the configured one)
    Show {
        #[command(flatten)]
        theme: ThemeArg,
    },

    /// Override the row color of a message code or a named group
    Set {
        /// Message code (e.g. 12) or group name (e.g. "Немає зв'язку")
        target: String,

        /// Row color as #rrggbb
        #[arg(id = "row_color", value_name = "COLOR")]
        color: String,

        #[command(flatten)]
        theme: ThemeArg,
    },

    /// Drop all overrides of a theme
    Reset {
        #[command(flatten)]
        theme: ThemeArg,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init {
        /// Write defaults without prompting
        #[arg(long)]
        defaults: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Store the database password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
