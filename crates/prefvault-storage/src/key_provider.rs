use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use prefvault_core::vault::{SecretVault, VaultError};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::debug;

/// Vault name of the symmetric key.
pub const KEY_NAME: &str = "key";
/// Vault name of the initialization vector.
pub const IV_NAME: &str = "iv";

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

/// Key material used for every encrypt/decrypt in the process.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// 256-bit symmetric key.
    pub key: [u8; KEY_LEN],
    /// 128-bit initialization vector.
    pub iv: [u8; IV_LEN],
}

// Never print key bytes.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Lazily creates the key and IV in a [`SecretVault`] and reads them back.
///
/// Material is read from the vault on every call; nothing is cached, so an
/// external reset of the vault is observed immediately.
pub struct SecretProvisioner<V: SecretVault> {
    vault: V,
}

impl<V: SecretVault> SecretProvisioner<V> {
    pub fn new(vault: V) -> Self {
        Self { vault }
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub async fn get_key(&self) -> Result<[u8; KEY_LEN], KeyError> {
        self.get_or_create::<KEY_LEN>(KEY_NAME).await
    }

    pub async fn get_iv(&self) -> Result<[u8; IV_LEN], KeyError> {
        self.get_or_create::<IV_LEN>(IV_NAME).await
    }

    pub async fn material(&self) -> Result<KeyMaterial, KeyError> {
        Ok(KeyMaterial {
            key: self.get_key().await?,
            iv: self.get_iv().await?,
        })
    }

    async fn get_or_create<const N: usize>(&self, name: &str) -> Result<[u8; N], KeyError> {
        if let Some(secret) = self.vault.read(name).await? {
            return decode_secret(name, &secret);
        }

        let bytes = generate::<N>();
        self.vault.write(name, &encode_secret(&bytes)).await?;
        debug!(entry = name, "generated key material");
        Ok(bytes)
    }
}

fn generate<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

fn encode_secret(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

fn decode_secret<const N: usize>(name: &str, secret: &str) -> Result<[u8; N], KeyError> {
    let bytes = general_purpose::STANDARD
        .decode(secret)
        .map_err(|e| KeyError::Decode(format!("{name}: {e}")))?;

    bytes.try_into().map_err(|bytes: Vec<u8>| {
        KeyError::Decode(format!(
            "{name}: expected {N} bytes, got {}",
            bytes.len()
        ))
    })
}
