use std::path::PathBuf;

use crate::config::Config;
use color_eyre::Result;
use dirs::data_dir;
use prefvault_storage::{
    encrypted_store::EncryptedPrefs, json_file_store::JsonFileStore,
    keyring_vault::KeyringVault,
};
use tracing::debug;

pub type ProductionPrefs = EncryptedPrefs<KeyringVault, JsonFileStore>;

/// Resolve the default preferences file.
pub fn default_data_file() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("prefvault").join("prefs.json"))
}

/// Build the keychain-backed store, honouring config overrides.
pub fn prefs_from_config(config: &Config) -> Result<ProductionPrefs> {
    let path = match &config.data_file {
        Some(path) => {
            debug!(?path, "opening preferences (config override)");
            path.clone()
        }
        None => {
            let path = default_data_file()?;
            debug!(?path, "opening preferences");
            path
        }
    };

    Ok(EncryptedPrefs::new(
        KeyringVault::new(config.keyring_service()),
        JsonFileStore::new(path),
    ))
}

/// Helper for tests: a file store under `root` with an in-memory vault.
#[cfg(test)]
pub fn test_prefs(
    root: impl Into<PathBuf>,
) -> EncryptedPrefs<prefvault_core::vault::InMemoryVault, JsonFileStore> {
    EncryptedPrefs::new(
        prefvault_core::vault::InMemoryVault::new(),
        JsonFileStore::new(root.into().join("prefs.json")),
    )
}
