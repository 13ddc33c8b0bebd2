//! `firedesk-tui`: dispatcher console for the fire monitoring desk.
//!
//! Object list on the left; active alarms and the event log on the
//! right. A background data bridge forwards console updates from the
//! pollers into the action loop. Logs go to a file so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod connect;
mod data_bridge;
mod event;
mod panes;
mod theme;
mod tui;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use firedesk_core::Console;

use crate::app::App;
use crate::connect::open_store;

/// Terminal console for fire alarm monitoring.
#[derive(Parser, Debug)]
#[command(name = "firedesk-tui", version, about)]
struct Cli {
    /// Run against built-in demo data instead of the database
    #[arg(long, env = "FIREDESK_DEMO")]
    demo: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "FIREDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Log file (defaults to firedesk-tui.log in the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. Hold the guard until exit so the writer flushes.
fn setup_tracing(cli: &Cli) -> Result<WorkerGuard> {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "firedesk_tui={log_level},firedesk_core={log_level},firedesk_store={log_level}"
        ))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| firedesk_config::data_dir().join("firedesk-tui.log"));
    let log_dir = log_file
        .parent()
        .map_or_else(std::env::temp_dir, std::path::Path::to_path_buf);
    std::fs::create_dir_all(&log_dir)
        .wrap_err_with(|| format!("cannot create log directory {}", log_dir.display()))?;
    let log_name = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("firedesk-tui.log"));

    let file_appender = tracing_appender::rolling::never(&log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks first so a panic during setup still restores the terminal.
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli)?;

    let config_path = cli.config.clone().unwrap_or_else(firedesk_config::config_path);
    let prefs = firedesk_config::load_config_from(&config_path)
        .wrap_err_with(|| format!("cannot load {}", config_path.display()))?;
    info!(config = %config_path.display(), demo = cli.demo, "starting firedesk-tui");

    let store = open_store(cli.demo, &prefs).await?;
    let settings = prefs.theme_settings().wrap_err("invalid [colors] settings")?;
    let console = Console::new(store, Arc::new(settings), prefs.console_options());

    let mut app = App::new(
        console,
        prefs.ui.operator.clone(),
        config_path,
        cli.demo,
        prefs.ui.object_list_split,
    );
    app.run().await
}
