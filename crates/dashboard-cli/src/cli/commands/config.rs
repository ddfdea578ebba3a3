//! `dashboard config` handlers.

use anyhow::{Context, Result};
use dashboard_core::config::{ApiConfig, Config, paths};
use dashboard_core::storage::FileStore;

/// Prints the config file path. Stdout carries only the path.
pub fn path() {
    let config_path = paths::config_path();
    println!("{}", config_path.display());
    if !config_path.exists() {
        eprintln!("(not created yet; defaults apply until `dashboard config init`)");
    }
}

/// Writes the default config and shows where the other files live.
pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    Config::init(&config_path)
        .with_context(|| format!("write default config to {}", config_path.display()))?;

    println!("Created config at {}", config_path.display());
    println!("  API:     {}", ApiConfig::DEFAULT_BASE_URL);
    println!("  Session: {}", FileStore::open_default().path().display());
    println!("  Logs:    {}", paths::logs_dir().display());
    Ok(())
}
