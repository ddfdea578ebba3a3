//! CLI command handlers.

pub mod auth;
pub mod browse;
pub mod config;

use anyhow::{Context, Result};
use dashboard_core::session::SessionStore;
use dashboard_core::storage::FileStore;

/// Loads the persisted session from the default store.
pub fn load_session() -> Result<SessionStore<FileStore>> {
    let store = FileStore::open_default();
    let path = store.path().to_path_buf();
    SessionStore::load(store).with_context(|| format!("load session from {}", path.display()))
}
