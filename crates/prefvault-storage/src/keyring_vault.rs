use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use keyring::Entry;
use prefvault_core::vault::{SecretVault, VaultError};
use tracing::instrument;

/// OS keyring-backed vault. Each secret name is one keyring entry under
/// a shared service; entry handles are created once per name and reused.
pub struct KeyringVault {
    service: String,
    entries: Mutex<HashMap<String, Arc<Entry>>>,
}

impl KeyringVault {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entry(&self, name: &str) -> Result<Arc<Entry>, VaultError> {
        let mut entries = self.entries.lock().map_err(|err| VaultError::Unavailable {
            reason: format!("lock poisoned: {err}"),
        })?;
        if let Some(entry) = entries.get(name) {
            return Ok(Arc::clone(entry));
        }
        let entry = Arc::new(Entry::new(&self.service, name).map_err(vault_err)?);
        entries.insert(name.to_string(), Arc::clone(&entry));
        Ok(entry)
    }
}

// Keyring operations are synchronous; wrapped in async for trait compatibility.
#[async_trait]
impl SecretVault for KeyringVault {
    #[instrument(skip(self))]
    async fn read(&self, name: &str) -> Result<Option<String>, VaultError> {
        match self.entry(name)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(vault_err(err)),
        }
    }

    #[instrument(skip(self, value))]
    async fn write(&self, name: &str, value: &str) -> Result<(), VaultError> {
        self.entry(name)?.set_password(value).map_err(vault_err)
    }

    #[instrument(skip(self))]
    async fn remove(&self, name: &str) -> Result<(), VaultError> {
        match self.entry(name)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(vault_err(err)),
        }
    }
}

fn vault_err(err: keyring::Error) -> VaultError {
    VaultError::Unavailable {
        reason: format!("keyring: {err}"),
    }
}
