use prefvault_core::{
    prefs::{PrefKind, PreferenceStore, StoreError},
    vault::SecretVault,
};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::{
    cipher::{CipherError, PrefsCipher},
    key_provider::{KeyError, SecretProvisioner},
};

/// Fatal failures of a preference operation. Decrypt failures never show up
/// here; they are absorbed into `None` or a dropped list element.
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Encrypt-on-write / decrypt-on-read view over a `PreferenceStore`.
///
/// Text and text-list entries are encrypted unless the caller passes
/// `no_crypt`; booleans and numbers are stored as-is. The store keeps no
/// marker of which mode was used, so the same `no_crypt` flag must be passed
/// when reading a name as when writing it.
///
/// Construct one at startup and share it by reference. There is no internal
/// locking: concurrent writes to one name are last-write-wins.
pub struct EncryptedPrefs<V: SecretVault, S: PreferenceStore> {
    cipher: PrefsCipher<V>,
    store: S,
}

impl<V: SecretVault, S: PreferenceStore> EncryptedPrefs<V, S> {
    pub fn new(vault: V, store: S) -> Self {
        Self {
            cipher: PrefsCipher::new(SecretProvisioner::new(vault)),
            store,
        }
    }

    pub fn cipher(&self) -> &PrefsCipher<V> {
        &self.cipher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(skip(self, value))]
    pub async fn set_string(
        &self,
        name: &str,
        value: &str,
        no_crypt: bool,
    ) -> Result<(), PrefsError> {
        if no_crypt {
            self.store.set_string(name, value).await?;
            return Ok(());
        }
        let encoded = self.cipher.encrypt(value).await?;
        self.store.set_string(name, &encoded).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_string(
        &self,
        name: &str,
        no_crypt: bool,
    ) -> Result<Option<String>, PrefsError> {
        let Some(stored) = self.store.get_string(name).await? else {
            return Ok(None);
        };
        if no_crypt {
            return Ok(Some(stored));
        }
        match self.cipher.decrypt(&stored).await {
            Ok(plaintext) => Ok(Some(plaintext)),
            Err(CipherError::Decrypt(err)) => {
                warn!(entry = name, error = %err, "dropping undecryptable value");
                Ok(None)
            }
            Err(CipherError::Key(err)) => Err(err.into()),
        }
    }

    #[instrument(skip(self, values), fields(len = values.len()))]
    pub async fn set_string_list(
        &self,
        name: &str,
        values: &[String],
        no_crypt: bool,
    ) -> Result<(), PrefsError> {
        if no_crypt {
            self.store.set_string_list(name, values).await?;
            return Ok(());
        }
        let mut encoded = Vec::with_capacity(values.len());
        for value in values {
            encoded.push(self.cipher.encrypt(value).await?);
        }
        self.store.set_string_list(name, &encoded).await?;
        Ok(())
    }

    /// Elements that fail to decrypt are dropped; the rest keep their order.
    #[instrument(skip(self))]
    pub async fn get_string_list(
        &self,
        name: &str,
        no_crypt: bool,
    ) -> Result<Option<Vec<String>>, PrefsError> {
        let Some(stored) = self.store.get_string_list(name).await? else {
            return Ok(None);
        };
        if no_crypt {
            return Ok(Some(stored));
        }

        let mut values = Vec::with_capacity(stored.len());
        for (index, element) in stored.iter().enumerate() {
            match self.cipher.decrypt(element).await {
                Ok(plaintext) => values.push(plaintext),
                Err(CipherError::Decrypt(err)) => {
                    warn!(
                        entry = name,
                        index,
                        error = %err,
                        "dropping undecryptable list element"
                    );
                }
                Err(CipherError::Key(err)) => return Err(err.into()),
            }
        }
        Ok(Some(values))
    }

    pub async fn set_bool(&self, name: &str, value: bool) -> Result<(), PrefsError> {
        Ok(self.store.set_bool(name, value).await?)
    }

    pub async fn get_bool(&self, name: &str) -> Result<Option<bool>, PrefsError> {
        Ok(self.store.get_bool(name).await?)
    }

    pub async fn set_int(&self, name: &str, value: i64) -> Result<(), PrefsError> {
        Ok(self.store.set_int(name, value).await?)
    }

    pub async fn get_int(&self, name: &str) -> Result<Option<i64>, PrefsError> {
        Ok(self.store.get_int(name).await?)
    }

    pub async fn set_double(&self, name: &str, value: f64) -> Result<(), PrefsError> {
        Ok(self.store.set_double(name, value).await?)
    }

    pub async fn get_double(&self, name: &str) -> Result<Option<f64>, PrefsError> {
        Ok(self.store.get_double(name).await?)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, name: &str) -> Result<(), PrefsError> {
        Ok(self.store.remove(name).await?)
    }

    pub async fn contains(&self, name: &str) -> Result<bool, PrefsError> {
        Ok(self.store.contains(name).await?)
    }

    pub async fn keys(&self) -> Result<Vec<String>, PrefsError> {
        Ok(self.store.keys().await?)
    }

    /// Stored kind of `name`, if present. Says nothing about encryption.
    pub async fn kind_of(&self, name: &str) -> Result<Option<PrefKind>, PrefsError> {
        Ok(self.store.get_value(name).await?.map(|value| value.kind()))
    }
}
