use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by secret vault implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    /// The backing secure storage could not be read or written.
    #[error("vault unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Named-secret storage backed by OS-protected storage in production.
///
/// Only cryptographic secrets go here; everything else belongs in a
/// [`PreferenceStore`](crate::prefs::PreferenceStore).
#[async_trait]
pub trait SecretVault: Send + Sync {
    /// Read the secret stored under `name`, `None` when absent.
    async fn read(&self, name: &str) -> Result<Option<String>, VaultError>;

    /// Persist a secret under `name`, overwriting any existing value.
    async fn write(&self, name: &str, value: &str) -> Result<(), VaultError>;

    /// Remove a secret (idempotent).
    async fn remove(&self, name: &str) -> Result<(), VaultError>;
}

/// In-memory vault for tests and ephemeral sessions.
///
/// Clones share the same backing map, so a test can keep a handle for
/// inspection after moving one into a component.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVault {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SecretVault for InMemoryVault {
    async fn read(&self, name: &str) -> Result<Option<String>, VaultError> {
        let map = self.inner.lock().map_err(poisoned)?;
        Ok(map.get(name).cloned())
    }

    async fn write(&self, name: &str, value: &str) -> Result<(), VaultError> {
        let mut map = self.inner.lock().map_err(poisoned)?;
        map.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), VaultError> {
        let mut map = self.inner.lock().map_err(poisoned)?;
        map.remove(name);
        Ok(())
    }
}

fn poisoned<E: std::fmt::Display>(err: E) -> VaultError {
    VaultError::Unavailable {
        reason: format!("lock poisoned: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_returns_written_secret() {
        let vault = InMemoryVault::new();
        assert_eq!(vault.read("key").await.expect("read"), None);

        vault.write("key", "c2VjcmV0").await.expect("write");
        assert_eq!(
            vault.read("key").await.expect("read").as_deref(),
            Some("c2VjcmV0")
        );
        assert_eq!(vault.len(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let vault = InMemoryVault::new();
        vault.write("iv", "AAAA").await.expect("write");
        vault.remove("iv").await.expect("remove");
        vault.remove("iv").await.expect("remove again");
        assert!(vault.is_empty());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let vault = InMemoryVault::new();
        let handle = vault.clone();
        vault.write("key", "v").await.expect("write");
        assert_eq!(handle.read("key").await.expect("read").as_deref(), Some("v"));
    }
}
