//! Shared helpers for command handlers.

use std::path::PathBuf;

use firedesk_core::{ObjectId, Theme, parse_object_id};

use crate::cli::{GlobalOpts, ThemeArg};
use crate::error::CliError;

/// Parse an object number argument.
pub fn object_id(input: &str) -> Result<ObjectId, CliError> {
    Ok(parse_object_id(input)?)
}

/// `--dark` / `--light`, falling back to `configured`.
pub fn theme(arg: &ThemeArg, configured: Theme) -> Theme {
    if arg.dark {
        Theme::Dark
    } else if arg.light {
        Theme::Light
    } else {
        configured
    }
}

/// The config file in effect: `--config` or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(firedesk_config::config_path)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for confirmation, defaulting to "no".
pub fn confirm(message: &str) -> Result<bool, CliError> {
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// `—` for empty values in detail views.
pub fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "—".into()
    } else {
        value.to_owned()
    }
}
