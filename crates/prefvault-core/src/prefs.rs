use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of a stored preference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefKind {
    Boolean,
    Integer,
    Float,
    OpaqueText,
    TextList,
}

impl fmt::Display for PrefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PrefKind::Boolean => "bool",
            PrefKind::Integer => "int",
            PrefKind::Float => "double",
            PrefKind::OpaqueText => "text",
            PrefKind::TextList => "list",
        };
        f.write_str(label)
    }
}

/// A value as persisted by a preference store.
///
/// Serialized untagged so a JSON-backed store reads as a plain settings
/// object. Variant order matters for deserialization: integers must be
/// tried before floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    TextList(Vec<String>),
}

impl PrefValue {
    pub fn kind(&self) -> PrefKind {
        match self {
            PrefValue::Bool(_) => PrefKind::Boolean,
            PrefValue::Int(_) => PrefKind::Integer,
            PrefValue::Double(_) => PrefKind::Float,
            PrefValue::Text(_) => PrefKind::OpaqueText,
            PrefValue::TextList(_) => PrefKind::TextList,
        }
    }
}

/// Errors produced by preference store implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying storage failure.
    #[error("storage failure: {reason}")]
    Storage { reason: String },
    /// The entry exists but holds a different kind than requested.
    #[error("entry {name} holds a {found} value, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: PrefKind,
        found: PrefKind,
    },
    /// The backend cannot represent the value.
    #[error("unsupported value: {reason}")]
    Unsupported { reason: String },
}

impl StoreError {
    fn mismatch(name: &str, expected: PrefKind, found: &PrefValue) -> Self {
        StoreError::TypeMismatch {
            name: name.to_string(),
            expected,
            found: found.kind(),
        }
    }
}

/// Typed key-value store for application settings. Not encrypted by itself.
///
/// Backends implement the raw value operations; the typed accessors are
/// provided on top of them.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Fetch the raw value stored under `name`.
    async fn get_value(&self, name: &str) -> Result<Option<PrefValue>, StoreError>;

    /// Persist a raw value under `name`, overwriting any existing entry.
    async fn set_value(&self, name: &str, value: PrefValue) -> Result<(), StoreError>;

    /// Remove an entry of any kind (idempotent).
    async fn remove(&self, name: &str) -> Result<(), StoreError>;

    /// All stored names in ascending order.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;

    async fn contains(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.get_value(name).await?.is_some())
    }

    async fn get_string(&self, name: &str) -> Result<Option<String>, StoreError> {
        match self.get_value(name).await? {
            None => Ok(None),
            Some(PrefValue::Text(value)) => Ok(Some(value)),
            Some(other) => Err(StoreError::mismatch(name, PrefKind::OpaqueText, &other)),
        }
    }

    async fn set_string(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.set_value(name, PrefValue::Text(value.to_string()))
            .await
    }

    async fn get_string_list(&self, name: &str) -> Result<Option<Vec<String>>, StoreError> {
        match self.get_value(name).await? {
            None => Ok(None),
            Some(PrefValue::TextList(values)) => Ok(Some(values)),
            Some(other) => Err(StoreError::mismatch(name, PrefKind::TextList, &other)),
        }
    }

    async fn set_string_list(&self, name: &str, values: &[String]) -> Result<(), StoreError> {
        self.set_value(name, PrefValue::TextList(values.to_vec()))
            .await
    }

    async fn get_bool(&self, name: &str) -> Result<Option<bool>, StoreError> {
        match self.get_value(name).await? {
            None => Ok(None),
            Some(PrefValue::Bool(value)) => Ok(Some(value)),
            Some(other) => Err(StoreError::mismatch(name, PrefKind::Boolean, &other)),
        }
    }

    async fn set_bool(&self, name: &str, value: bool) -> Result<(), StoreError> {
        self.set_value(name, PrefValue::Bool(value)).await
    }

    async fn get_int(&self, name: &str) -> Result<Option<i64>, StoreError> {
        match self.get_value(name).await? {
            None => Ok(None),
            Some(PrefValue::Int(value)) => Ok(Some(value)),
            Some(other) => Err(StoreError::mismatch(name, PrefKind::Integer, &other)),
        }
    }

    async fn set_int(&self, name: &str, value: i64) -> Result<(), StoreError> {
        self.set_value(name, PrefValue::Int(value)).await
    }

    async fn get_double(&self, name: &str) -> Result<Option<f64>, StoreError> {
        match self.get_value(name).await? {
            None => Ok(None),
            Some(PrefValue::Double(value)) => Ok(Some(value)),
            Some(other) => Err(StoreError::mismatch(name, PrefKind::Float, &other)),
        }
    }

    async fn set_double(&self, name: &str, value: f64) -> Result<(), StoreError> {
        self.set_value(name, PrefValue::Double(value)).await
    }
}

/// In-memory preference store for tests and smoke runs.
/// Clones share state, which lets tests inspect exactly what was persisted.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPreferenceStore {
    inner: Arc<Mutex<BTreeMap<String, PrefValue>>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value, bypassing any typed access.
    pub fn raw(&self, name: &str) -> Option<PrefValue> {
        self.inner
            .lock()
            .ok()
            .and_then(|map| map.get(name).cloned())
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get_value(&self, name: &str) -> Result<Option<PrefValue>, StoreError> {
        let map = self.inner.lock().map_err(poisoned)?;
        Ok(map.get(name).cloned())
    }

    async fn set_value(&self, name: &str, value: PrefValue) -> Result<(), StoreError> {
        let mut map = self.inner.lock().map_err(poisoned)?;
        map.insert(name.to_string(), value);
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        let mut map = self.inner.lock().map_err(poisoned)?;
        map.remove(name);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let map = self.inner.lock().map_err(poisoned)?;
        Ok(map.keys().cloned().collect())
    }
}

fn poisoned<E: fmt::Display>(err: E) -> StoreError {
    StoreError::Storage {
        reason: format!("lock poisoned: {err}"),
    }
}
