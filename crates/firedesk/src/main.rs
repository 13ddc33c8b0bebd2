mod cli;
mod commands;
mod error;
mod output;

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use firedesk_config::Preferences;
use firedesk_core::store::{DemoStore, FirebirdStore, LegacyStore};
use firedesk_core::{Console, CoreError};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch the database
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "firedesk", &mut std::io::stdout());
            Ok(())
        }

        // Color edits only read and write the preferences
        Command::Colors(args) => commands::colors::handle(args, &cli.global),

        cmd => {
            let prefs = load_preferences(&cli.global)?;
            let store = open_store(&cli.global, &prefs).await?;
            let theme = prefs.theme_settings()?;
            let console = Console::new(store, Arc::new(theme), prefs.console_options());

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &console, &cli.global).await
        }
    }
}

/// Config file (or `--config`) plus environment, with `--host` and
/// `--db-path` applied on top.
pub fn load_preferences(global: &GlobalOpts) -> Result<Preferences, CliError> {
    let mut prefs = match &global.config {
        Some(path) => firedesk_config::load_config_from(path)?,
        None => firedesk_config::load_config()?,
    };
    if let Some(host) = &global.host {
        prefs.db.host.clone_from(host);
    }
    if let Some(path) = &global.db_path {
        prefs.db.path.clone_from(path);
    }
    Ok(prefs)
}

async fn open_store(global: &GlobalOpts, prefs: &Preferences) -> Result<Arc<dyn LegacyStore>, CliError> {
    if global.demo {
        tracing::info!("using demo data");
        return Ok(Arc::new(DemoStore::new()));
    }

    let config = prefs.firebird_config()?;
    let target = format!("{}:{}/{}", config.host, config.port, config.path);
    let spinner = connect_spinner(global, &target);

    let opened = FirebirdStore::open(config).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match opened {
        Ok(store) => Ok(Arc::new(store)),
        Err(e) => match CoreError::from(e) {
            CoreError::StoreConnection { reason } => Err(CliError::ConnectionFailed { target, reason }),
            other => Err(other.into()),
        },
    }
}

/// Spinner on stderr while the pool connects; only for interactive use.
fn connect_spinner(global: &GlobalOpts, target: &str) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("connecting to {target}"));
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}
