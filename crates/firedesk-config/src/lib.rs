//! Shared configuration for the firedesk CLI and TUI.
//!
//! TOML preferences layered with figment, database password resolution
//! (env + keyring + plaintext), and translation into the store and
//! console settings both binaries start from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use firedesk_core::store::{FirebirdConfig, QueryTimeouts};
use firedesk_core::{Bootstrap, ConsoleOptions, DEFAULT_EVENT_CAPACITY, Rgb, Theme, ThemeSettings};

/// Environment variable checked first for the database password.
pub const PASSWORD_ENV: &str = "FIREDESK_DB_PASSWORD";
const KEYRING_SERVICE: &str = "firedesk";
const KEYRING_PASSWORD_ENTRY: &str = "db/password";
const DEFAULT_PASSWORD: &str = "masterkey";

pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 30.0;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level preferences shared by CLI and TUI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Preferences {
    #[serde(default)]
    pub db: DbSettings,

    #[serde(default)]
    pub ui: UiSettings,

    #[serde(default)]
    pub events: EventSettings,

    #[serde(default)]
    pub polling: PollSettings,

    /// Background overrides per theme, message code → `#rrggbb`.
    #[serde(default)]
    pub colors: ColorSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DbSettings {
    pub user: String,

    /// Plaintext password. Prefer the keyring or `FIREDESK_DB_PASSWORD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    pub host: String,
    pub port: u16,

    /// Database file path as the server sees it.
    pub path: String,

    /// `charset=...&auth_plugin_name=...`, optionally with a leading `?`.
    pub params: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            user: "SYSDBA".into(),
            password: None,
            host: "localhost".into(),
            port: 3050,
            path: "C:/MOST.PM/BASE/MOST5.FDB".into(),
            params: "charset=WIN1251&auth_plugin_name=Srp".into(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_pool_size() -> usize {
    4
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UiSettings {
    pub font_size: f32,
    pub font_size_objects: f32,
    pub font_size_events: f32,
    pub font_size_alarms: f32,
    pub dark_theme: bool,

    /// Share of the width given to the object list.
    pub object_list_split: f32,

    /// Name recorded on locally processed alarms.
    #[serde(default = "default_operator")]
    pub operator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            font_size: 13.0,
            font_size_objects: 13.0,
            font_size_events: 12.0,
            font_size_alarms: 13.0,
            dark_theme: true,
            object_list_split: 0.32,
            operator: default_operator(),
        }
    }
}

fn default_operator() -> String {
    "Диспетчер".into()
}

pub fn clamp_font_size(size: f32) -> f32 {
    if size.is_nan() {
        return MIN_FONT_SIZE;
    }
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

impl UiSettings {
    /// Bring every value into its allowed range.
    pub fn clamped(mut self) -> Self {
        self.font_size = clamp_font_size(self.font_size);
        self.font_size_objects = clamp_font_size(self.font_size_objects);
        self.font_size_events = clamp_font_size(self.font_size_events);
        self.font_size_alarms = clamp_font_size(self.font_size_alarms);
        self.object_list_split = if self.object_list_split.is_nan() {
            0.32
        } else {
            self.object_list_split.clamp(0.1, 0.9)
        };
        self
    }

    pub fn theme(&self) -> Theme {
        if self.dark_theme { Theme::Dark } else { Theme::Light }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventSettings {
    pub bootstrap: Bootstrap,
    pub capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            bootstrap: Bootstrap::default(),
            capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Poll periods in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollSettings {
    pub fast_secs: u64,
    pub slow_secs: u64,
    pub health_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            fast_secs: 2,
            slow_secs: 60,
            health_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColorSettings {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dark: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub light: BTreeMap<String, String>,
}

impl ColorSettings {
    fn for_theme(&self, theme: Theme) -> &BTreeMap<String, String> {
        match theme {
            Theme::Dark => &self.dark,
            Theme::Light => &self.light,
        }
    }

    fn for_theme_mut(&mut self, theme: Theme) -> &mut BTreeMap<String, String> {
        match theme {
            Theme::Dark => &mut self.dark,
            Theme::Light => &mut self.light,
        }
    }
}

// ── Connection params ───────────────────────────────────────────────

/// Parsed form of `db.params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub charset: String,
    pub auth_plugin: Option<String>,
}

const AUTH_PLUGINS: [&str; 3] = ["Srp", "Srp256", "Legacy_Auth"];

impl ConnectionParams {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut params = Self {
            charset: "WIN1251".into(),
            auth_plugin: None,
        };
        let query = raw.trim().trim_start_matches('?');
        for pair in query.split('&').filter(|p| !p.trim().is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ConfigError::Validation {
                    field: "db.params".into(),
                    reason: format!("expected key=value, got '{pair}'"),
                });
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "charset" | "lc_ctype" => value.clone_into(&mut params.charset),
                "auth_plugin_name" => {
                    if !AUTH_PLUGINS.iter().any(|p| p.eq_ignore_ascii_case(value)) {
                        return Err(ConfigError::Validation {
                            field: "db.params".into(),
                            reason: format!(
                                "unsupported auth plugin '{value}', expected one of {}",
                                AUTH_PLUGINS.join(", ")
                            ),
                        });
                    }
                    params.auth_plugin = Some(value.to_owned());
                }
                // Driver options this client has no equivalent for.
                _ => {}
            }
        }
        Ok(params)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("ua", "firedesk", "firedesk").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("firedesk");
    p
}

/// Directory for the TUI's log file.
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("ua", "firedesk", "firedesk").map_or_else(
        || dirs_fallback().join("data"),
        |dirs| dirs.data_local_dir().to_path_buf(),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load preferences from the canonical file + environment.
pub fn load_config() -> Result<Preferences, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then `path` (if it exists), then `FIREDESK_*` variables
/// (`FIREDESK_UI__DARK_THEME=false`).
pub fn load_config_from(path: &Path) -> Result<Preferences, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Preferences::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FIREDESK_").split("__"));

    let mut prefs: Preferences = figment.extract()?;
    prefs.ui = prefs.ui.clamped();
    Ok(prefs)
}

/// Load preferences, returning defaults if anything goes wrong.
pub fn load_config_or_default() -> Preferences {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize to TOML and write to the canonical config path.
pub fn save_config(prefs: &Preferences) -> Result<(), ConfigError> {
    save_config_to(prefs, &config_path())
}

pub fn save_config_to(prefs: &Preferences, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(prefs)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry() -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_PASSWORD_ENTRY)
}

/// Where a resolved password came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    Env,
    Keyring,
    ConfigFile,
    Default,
}

fn pick_password(
    env: Option<String>,
    keyring: impl FnOnce() -> Option<String>,
    plaintext: Option<&str>,
) -> (SecretString, PasswordSource) {
    if let Some(pw) = env {
        return (SecretString::from(pw), PasswordSource::Env);
    }
    if let Some(pw) = keyring() {
        return (SecretString::from(pw), PasswordSource::Keyring);
    }
    if let Some(pw) = plaintext {
        return (SecretString::from(pw.to_owned()), PasswordSource::ConfigFile);
    }
    (SecretString::from(DEFAULT_PASSWORD.to_owned()), PasswordSource::Default)
}

/// Resolve the database password: env var, then system keyring, then
/// plaintext in the config, then the server's factory default.
pub fn resolve_password(db: &DbSettings) -> (SecretString, PasswordSource) {
    pick_password(
        std::env::var(PASSWORD_ENV).ok(),
        || keyring_entry().ok().and_then(|e| e.get_password().ok()),
        db.password.as_deref(),
    )
}

/// Store the database password in the system keyring.
pub fn store_password(password: &str) -> Result<(), ConfigError> {
    keyring_entry()?.set_password(password)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Preferences {
    pub fn connection_params(&self) -> Result<ConnectionParams, ConfigError> {
        ConnectionParams::parse(&self.db.params)
    }

    /// Connection settings with the password resolved.
    pub fn firebird_config(&self) -> Result<FirebirdConfig, ConfigError> {
        let params = self.connection_params()?;
        if self.db.path.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "db.path".into(),
                reason: "database path is empty".into(),
            });
        }
        let (password, _) = resolve_password(&self.db);
        Ok(FirebirdConfig {
            host: self.db.host.trim().to_owned(),
            port: self.db.port,
            path: self.db.path.trim().to_owned(),
            user: self.db.user.trim().to_owned(),
            password,
            charset: params.charset,
            pool_size: self.db.pool_size.clamp(1, 16),
            timeouts: QueryTimeouts::default(),
        })
    }

    pub fn console_options(&self) -> ConsoleOptions {
        let secs = |s: u64| Duration::from_secs(s.max(1));
        ConsoleOptions {
            fast_interval: secs(self.polling.fast_secs),
            slow_interval: secs(self.polling.slow_secs),
            health_interval: secs(self.polling.health_secs),
            event_capacity: self.events.capacity.max(1),
            bootstrap: self.events.bootstrap,
        }
    }

    /// Build theme settings with the configured overrides applied.
    pub fn theme_settings(&self) -> Result<ThemeSettings, ConfigError> {
        let settings = ThemeSettings::new(self.ui.theme());
        self.apply_color_overrides(&settings)?;
        Ok(settings)
    }

    /// Apply `[colors.*]` through `set_color`. Returns how many codes
    /// were overridden.
    pub fn apply_color_overrides(&self, settings: &ThemeSettings) -> Result<usize, ConfigError> {
        let mut applied = 0;
        for theme in [Theme::Dark, Theme::Light] {
            for (code, color) in self.colors.for_theme(theme) {
                let field = || format!("colors.{theme}.{code}");
                let code: i64 = code.trim().parse().map_err(|_| ConfigError::Validation {
                    field: field(),
                    reason: "message code must be an integer".into(),
                })?;
                let row: Rgb = color.parse().map_err(|e: firedesk_core::CoreError| {
                    ConfigError::Validation {
                        field: field(),
                        reason: e.to_string(),
                    }
                })?;
                settings.set_color(code, theme, row);
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Replace `[colors.*]` with the overrides currently in `settings`.
    pub fn capture_color_overrides(&mut self, settings: &ThemeSettings) {
        for theme in [Theme::Dark, Theme::Light] {
            let map = self.colors.for_theme_mut(theme);
            map.clear();
            for (code, row) in settings.overrides(theme) {
                map.insert(code.to_string(), row.to_string());
            }
        }
        self.ui.dark_theme = settings.active() == Theme::Dark;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn params_parse_charset_and_plugin() {
        let params = ConnectionParams::parse("?charset=UTF8&auth_plugin_name=Srp256").unwrap();
        assert_eq!(params.charset, "UTF8");
        assert_eq!(params.auth_plugin.as_deref(), Some("Srp256"));

        let defaults = ConnectionParams::parse("").unwrap();
        assert_eq!(defaults.charset, "WIN1251");
        assert_eq!(defaults.auth_plugin, None);

        assert!(ConnectionParams::parse("charset").is_err());
        assert!(ConnectionParams::parse("auth_plugin_name=Kerberos").is_err());
    }

    #[test]
    fn ui_values_are_clamped() {
        let ui = UiSettings {
            font_size: 4.0,
            font_size_events: 45.0,
            object_list_split: 0.95,
            ..UiSettings::default()
        }
        .clamped();
        assert_eq!(ui.font_size, MIN_FONT_SIZE);
        assert_eq!(ui.font_size_events, MAX_FONT_SIZE);
        assert_eq!(ui.font_size_alarms, 13.0);
        assert_eq!(ui.object_list_split, 0.9);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut prefs = Preferences::default();
        prefs.db.host = "10.0.0.5".into();
        prefs.events.bootstrap = Bootstrap::Backfill;
        prefs.colors.dark.insert("12".into(), "#112233".into());
        save_config_to(&prefs, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("bootstrap = \"backfill\""));
        assert!(!raw.contains("password"));

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.db.host, "10.0.0.5");
        assert_eq!(loaded.events.bootstrap, Bootstrap::Backfill);
        assert_eq!(loaded.colors.dark.get("12").map(String::as_str), Some("#112233"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(prefs.db.port, 3050);
        assert_eq!(prefs.db.user, "SYSDBA");
        assert!(prefs.ui.dark_theme);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ui]\nfont_size = 2.0\ndark_theme = false\n").unwrap();
        let prefs = load_config_from(&path).unwrap();
        assert_eq!(prefs.ui.font_size, MIN_FONT_SIZE);
        assert_eq!(prefs.ui.font_size_events, 12.0);
        assert_eq!(prefs.ui.theme(), Theme::Light);
    }

    #[test]
    fn password_chain_order() {
        let (pw, src) = pick_password(Some("env".into()), || Some("ring".into()), Some("file"));
        assert_eq!((pw.expose_secret(), src), ("env", PasswordSource::Env));

        let (pw, src) = pick_password(None, || Some("ring".into()), Some("file"));
        assert_eq!((pw.expose_secret(), src), ("ring", PasswordSource::Keyring));

        let (pw, src) = pick_password(None, || None, Some("file"));
        assert_eq!((pw.expose_secret(), src), ("file", PasswordSource::ConfigFile));

        let (pw, src) = pick_password(None, || None, None);
        assert_eq!((pw.expose_secret(), src), ("masterkey", PasswordSource::Default));
    }

    #[test]
    fn color_overrides_apply_and_capture() {
        let mut prefs = Preferences::default();
        prefs.colors.light.insert("1".into(), "#ff0000".into());
        let settings = ThemeSettings::new(Theme::Dark);
        assert_eq!(prefs.apply_color_overrides(&settings).unwrap(), 1);
        assert_eq!(settings.classify(1, Theme::Light).row, Rgb::new(255, 0, 0));

        let mut captured = Preferences::default();
        captured.capture_color_overrides(&settings);
        assert_eq!(captured.colors.light.get("1").map(String::as_str), Some("#ff0000"));
        assert!(captured.colors.dark.is_empty());

        prefs.colors.dark.insert("x".into(), "#000000".into());
        assert!(matches!(
            prefs.apply_color_overrides(&settings),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn console_options_follow_preferences() {
        let mut prefs = Preferences::default();
        prefs.polling.fast_secs = 0;
        prefs.events.capacity = 500;
        let options = prefs.console_options();
        assert_eq!(options.fast_interval, Duration::from_secs(1));
        assert_eq!(options.slow_interval, Duration::from_secs(60));
        assert_eq!(options.event_capacity, 500);
    }
}
