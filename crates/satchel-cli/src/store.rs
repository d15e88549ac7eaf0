use color_eyre::Result;
use satchel_core::store::InMemoryStore;
use satchel_fs::adapter::{FsAdapter, FsConfig};
use tracing::debug;

use crate::config::Config;

/// Build the filesystem adapter using config overrides.
pub fn adapter_from_config(config: &Config) -> Result<FsAdapter> {
    debug!(directory = ?config.directory, "initializing fs adapter");
    FsAdapter::new(FsConfig {
        directory: config.directory.clone(),
        cipher_key: config.cipher_key.clone(),
    })
    .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))
}

/// Empty in-memory store handle carrying the configured identity.
pub fn store_from_config(config: &Config) -> InMemoryStore {
    InMemoryStore::new(config.store_id(), config.key_field())
}

/// Helper for tests to construct a plaintext adapter rooted at a temp dir.
#[cfg(test)]
pub fn test_adapter(root: impl Into<std::path::PathBuf>) -> FsAdapter {
    FsAdapter::new(FsConfig {
        directory: Some(root.into()),
        cipher_key: None,
    })
    .expect("plaintext adapter")
}
