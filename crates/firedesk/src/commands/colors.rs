//! Severity color commands.
//!
//! Edits go through `ThemeSettings` so the saved overrides are exactly
//! what the consoles would apply at start-up.

use serde::Serialize;
use tabled::Tabled;

use firedesk_config::Preferences;
use firedesk_core::{COLOR_GROUPS, ColorPair, MessageCategory, Rgb, Theme, ThemeSettings};

use crate::cli::{ColorsArgs, ColorsCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

/// One line of a severity table. `code` is `None` for the fallback.
#[derive(Debug, Serialize)]
struct ColorEntry {
    code: Option<i64>,
    category: String,
    text: Rgb,
    row: Rgb,
    overridden: bool,
}

#[derive(Tabled)]
struct ColorRow {
    #[tabled(rename = "Код")]
    code: String,
    #[tabled(rename = "Категорія")]
    category: String,
    #[tabled(rename = "Текст")]
    text: String,
    #[tabled(rename = "Фон")]
    row: String,
    #[tabled(rename = "Змінено")]
    overridden: &'static str,
}

impl From<&ColorEntry> for ColorRow {
    fn from(e: &ColorEntry) -> Self {
        Self {
            code: e.code.map_or_else(|| "—".into(), |c| c.to_string()),
            category: e.category.clone(),
            text: e.text.to_string(),
            row: e.row.to_string(),
            overridden: if e.overridden { "так" } else { "" },
        }
    }
}

fn entries(settings: &ThemeSettings, theme: Theme) -> Vec<ColorEntry> {
    let table = settings.table(theme);
    let overrides = settings.overrides(theme);
    let mut out: Vec<ColorEntry> = table
        .entries()
        .map(|(code, ColorPair { text, row })| ColorEntry {
            code: Some(code),
            category: MessageCategory::of_code(code).to_string(),
            text,
            row,
            overridden: overrides.contains_key(&code),
        })
        .collect();
    let fallback = table.fallback();
    out.push(ColorEntry {
        code: None,
        category: MessageCategory::Unmapped.to_string(),
        text: fallback.text,
        row: fallback.row,
        overridden: false,
    });
    out
}

/// Painted swatch lines; tabled would miscount the escape codes.
fn swatches(entries: &[ColorEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            let code = e.code.map_or_else(|| "—".into(), |c| c.to_string());
            let mark = if e.overridden { " *" } else { "" };
            let sample = format!(" {code:>4}  {:<14} {} / {} ", e.category, e.text, e.row);
            format!(
                "{}{mark}",
                output::paint(&sample, ColorPair { text: e.text, row: e.row }, true)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Codes named by `target`: a message code or a group name.
fn resolve_target(target: &str) -> Result<Vec<i64>, CliError> {
    if let Ok(code) = target.trim().parse::<i64>() {
        return Ok(vec![code]);
    }
    let wanted = target.trim().to_lowercase();
    COLOR_GROUPS
        .iter()
        .find(|g| g.name.to_lowercase() == wanted)
        .map(|g| g.codes.to_vec())
        .ok_or_else(|| CliError::Validation {
            field: "target".into(),
            reason: format!(
                "'{target}' is neither a message code nor a group ({})",
                COLOR_GROUPS.iter().map(|g| g.name).collect::<Vec<_>>().join(", ")
            ),
        })
}

fn persist(prefs: &mut Preferences, settings: &ThemeSettings, global: &GlobalOpts) -> Result<(), CliError> {
    prefs.capture_color_overrides(settings);
    let path = util::config_file(global);
    firedesk_config::save_config_to(prefs, &path)?;
    tracing::info!(path = %path.display(), "color overrides saved");
    Ok(())
}

pub fn handle(args: ColorsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut prefs = crate::load_preferences(global)?;
    let settings = prefs.theme_settings()?;

    match args.command {
        ColorsCommand::Show { theme } => {
            let theme = util::theme(&theme, prefs.ui.theme());
            let entries = entries(&settings, theme);
            let out = if matches!(global.output, OutputFormat::Table) && output::should_color(&global.color) {
                swatches(&entries)
            } else {
                output::render_list(&global.output, &entries, |e| ColorRow::from(e), |e| {
                    format!("{} {}", e.code.map_or_else(|| "default".into(), |c| c.to_string()), e.row)
                })?
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ColorsCommand::Set { target, color, theme } => {
            let theme = util::theme(&theme, prefs.ui.theme());
            let row: Rgb = color.parse()?;
            let codes = resolve_target(&target)?;
            for &code in &codes {
                settings.set_color(code, theme, row);
            }
            persist(&mut prefs, &settings, global)?;
            if !global.quiet {
                eprintln!("✓ {theme}: {} → {row}", join_codes(&codes));
            }
            Ok(())
        }

        ColorsCommand::Reset { theme } => {
            let theme = util::theme(&theme, prefs.ui.theme());
            settings.reset_to_default(theme);
            persist(&mut prefs, &settings, global)?;
            if !global.quiet {
                eprintln!("✓ {theme}: built-in colors restored");
            }
            Ok(())
        }
    }
}

fn join_codes(codes: &[i64]) -> String {
    codes.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
