//! Config subcommand handlers.

use dialoguer::{Input, Select};

use firedesk_config::{ConnectionParams, PasswordSource, Preferences};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::{self, prompt_err};

// ── Init wizard ─────────────────────────────────────────────────────

fn wizard(path: &std::path::Path) -> Result<Preferences, CliError> {
    eprintln!("firedesk: configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let mut prefs = Preferences::default();

    prefs.db.host = Input::new()
        .with_prompt("Database host")
        .default(prefs.db.host.clone())
        .interact_text()
        .map_err(prompt_err)?;

    prefs.db.port = Input::new()
        .with_prompt("Port")
        .default(prefs.db.port)
        .interact_text()
        .map_err(prompt_err)?;

    prefs.db.path = Input::new()
        .with_prompt("Database file (as the server sees it)")
        .default(prefs.db.path.clone())
        .interact_text()
        .map_err(prompt_err)?;

    prefs.db.user = Input::new()
        .with_prompt("User")
        .default(prefs.db.user.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let params: String = Input::new()
        .with_prompt("Connection params")
        .default(prefs.db.params.clone())
        .interact_text()
        .map_err(prompt_err)?;
    ConnectionParams::parse(&params)?;
    prefs.db.params = params;

    let password = rpassword::prompt_password("Password (empty keeps the server default): ").map_err(prompt_err)?;
    if !password.is_empty() {
        let choices = &["Store in system keyring (recommended)", "Save to config file (plaintext)"];
        let selection = Select::new()
            .with_prompt("Where to store the password?")
            .items(choices)
            .default(0)
            .interact()
            .map_err(prompt_err)?;
        if selection == 0 {
            firedesk_config::store_password(&password)?;
            eprintln!("   ✓ Password stored in system keyring");
        } else {
            prefs.db.password = Some(password);
        }
    }

    let themes = &["Dark", "Light"];
    let theme = Select::new()
        .with_prompt("Console theme")
        .items(themes)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    prefs.ui.dark_theme = theme == 0;

    prefs.ui.operator = Input::new()
        .with_prompt("Operator name")
        .default(prefs.ui.operator.clone())
        .interact_text()
        .map_err(prompt_err)?;

    Ok(prefs)
}

fn source_label(source: PasswordSource) -> &'static str {
    match source {
        PasswordSource::Env => firedesk_config::PASSWORD_ENV,
        PasswordSource::Keyring => "system keyring",
        PasswordSource::ConfigFile => "config file",
        PasswordSource::Default => "server default",
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = util::config_file(global);

    match args.command {
        ConfigCommand::Init { defaults } => {
            if path.exists() && !defaults && !util::confirm(&format!("Overwrite {}?", path.display()))? {
                return Ok(());
            }
            let prefs = if defaults {
                Preferences::default()
            } else {
                wizard(&path)?
            };
            firedesk_config::save_config_to(&prefs, &path)?;
            if !global.quiet {
                eprintln!("✓ Configuration written to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let mut prefs = crate::load_preferences(global)?;
            let (_, source) = firedesk_config::resolve_password(&prefs.db);
            // Never echo a plaintext password.
            if prefs.db.password.is_some() {
                prefs.db.password = Some("********".into());
            }
            let out = output::render_single(
                &global.output,
                &prefs,
                |p| {
                    let body = toml::to_string_pretty(p).unwrap_or_else(|e| format!("<unprintable: {e}>"));
                    format!("# {}\n# password: {}\n\n{body}", path.display(), source_label(source))
                },
                |_| path.display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let password = rpassword::prompt_password("Database password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            firedesk_config::store_password(&password)?;
            if !global.quiet {
                eprintln!("✓ Password stored in system keyring");
            }
            Ok(())
        }
    }
}
