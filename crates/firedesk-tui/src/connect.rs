//! Opening the legacy store from the config file, at startup and on
//! operator-requested reconnects.

use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use firedesk_config::Preferences;
use firedesk_core::Console;
use firedesk_core::store::{DemoStore, FirebirdStore, LegacyStore};

pub async fn open_store(demo: bool, prefs: &Preferences) -> Result<Arc<dyn LegacyStore>> {
    if demo {
        info!("using demo data");
        return Ok(Arc::new(DemoStore::new()));
    }
    let config = prefs.firebird_config().wrap_err("invalid [db] settings")?;
    let target = format!("{}:{}/{}", config.host, config.port, config.path);
    let store = FirebirdStore::open(config)
        .await
        .wrap_err_with(|| format!("cannot connect to {target}"))?;
    Ok(Arc::new(store))
}

/// Re-read `config_path`, open a fresh store and switch `console` to it.
///
/// Any failure leaves the console on its current store.
pub async fn reconnect_from(console: &Console, config_path: &Path, demo: bool) -> Result<()> {
    let prefs = firedesk_config::load_config_from(config_path)
        .wrap_err_with(|| format!("cannot load {}", config_path.display()))?;
    let store = open_store(demo, &prefs).await?;
    console.reconnect(store).await.wrap_err("new database did not answer")?;
    Ok(())
}
