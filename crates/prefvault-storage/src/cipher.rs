use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use prefvault_core::vault::SecretVault;
use thiserror::Error;

use crate::key_provider::{KeyError, KeyMaterial, SecretProvisioner};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Why a ciphertext could not be turned back into text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecryptError {
    #[error("ciphertext is not valid base64: {0}")]
    Base64(String),
    /// Bad padding, truncated blocks, corruption or the wrong key.
    #[error("ciphertext failed to decrypt")]
    Padding,
    #[error("decrypted bytes are not valid UTF-8")]
    Utf8,
}

#[derive(Debug, Error)]
pub enum CipherError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Decrypt(#[from] DecryptError),
}

/// AES-256-CBC with PKCS#7 padding over base64 text, keyed from the vault.
///
/// The IV is fixed per installation, so equal plaintexts produce equal
/// ciphertexts.
pub struct PrefsCipher<V: SecretVault> {
    provisioner: SecretProvisioner<V>,
}

impl<V: SecretVault> PrefsCipher<V> {
    pub fn new(provisioner: SecretProvisioner<V>) -> Self {
        Self { provisioner }
    }

    pub fn provisioner(&self) -> &SecretProvisioner<V> {
        &self.provisioner
    }

    pub async fn encrypt(&self, plaintext: &str) -> Result<String, KeyError> {
        let material = self.provisioner.material().await?;
        Ok(encrypt_with(&material, plaintext))
    }

    pub async fn decrypt(&self, encoded: &str) -> Result<String, CipherError> {
        let material = self.provisioner.material().await?;
        Ok(decrypt_with(&material, encoded)?)
    }
}

pub fn encrypt_with(material: &KeyMaterial, plaintext: &str) -> String {
    let ciphertext = Aes256CbcEnc::new(&material.key.into(), &material.iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    STANDARD.encode(ciphertext)
}

pub fn decrypt_with(material: &KeyMaterial, encoded: &str) -> Result<String, DecryptError> {
    let ciphertext = STANDARD
        .decode(encoded)
        .map_err(|e| DecryptError::Base64(e.to_string()))?;
    let plaintext = Aes256CbcDec::new(&material.key.into(), &material.iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| DecryptError::Padding)?;
    String::from_utf8(plaintext).map_err(|_| DecryptError::Utf8)
}

/// Encrypts one raw block without padding, producing ciphertext whose
/// plaintext ends in a zero byte and so never unpads.
#[cfg(test)]
pub(crate) fn encrypt_unpadded_block(material: &KeyMaterial, block: [u8; 16]) -> String {
    use cbc::cipher::block_padding::NoPadding;

    let ciphertext = Aes256CbcEnc::new(&material.key.into(), &material.iv.into())
        .encrypt_padded_vec_mut::<NoPadding>(&block);
    STANDARD.encode(ciphertext)
}
