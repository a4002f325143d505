//! Encrypted preference storage.
//! Text values are sealed with AES-256-CBC under key material kept in an OS
//! keyring (or a test double); other values pass through to the store.

pub mod cipher;
pub mod encrypted_store;
pub mod json_file_store;
pub mod key_provider;
pub mod keyring_vault;
