use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use prefvault_core::prefs::{PrefValue, PreferenceStore, StoreError};
use tempfile::NamedTempFile;
use tracing::instrument;

type Entries = BTreeMap<String, PrefValue>;

/// Plain JSON settings file implementing the `PreferenceStore` contract.
/// The file is one object mapping names to values; it is not encrypted.
pub struct JsonFileStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Entries),
    {
        let _guard = self.write_lock.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        let mut entries = read_entries(&self.path)?;
        apply(&mut entries);
        write_entries(&self.path, &entries)
    }
}

#[async_trait]
impl PreferenceStore for JsonFileStore {
    #[instrument(skip_all, fields(entry = name))]
    async fn get_value(&self, name: &str) -> Result<Option<PrefValue>, StoreError> {
        let mut entries = read_entries(&self.path)?;
        Ok(entries.remove(name))
    }

    #[instrument(skip_all, fields(entry = name))]
    async fn set_value(&self, name: &str, value: PrefValue) -> Result<(), StoreError> {
        if let PrefValue::Double(v) = value {
            if !v.is_finite() {
                return Err(StoreError::Unsupported {
                    reason: format!("non-finite double {v} cannot be stored as JSON"),
                });
            }
        }
        self.update(|entries| {
            entries.insert(name.to_string(), value);
        })
    }

    #[instrument(skip_all, fields(entry = name))]
    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(name);
        })
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(read_entries(&self.path)?.into_keys().collect())
    }
}

fn read_entries(path: &Path) -> Result<Entries, StoreError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
        Err(err) => return Err(storage_err(err)),
    };

    let mut buf = String::new();
    file.read_to_string(&mut buf).map_err(storage_err)?;
    if buf.trim().is_empty() {
        return Ok(Entries::new());
    }
    serde_json::from_str(&buf).map_err(storage_err)
}

fn write_entries(path: &Path, entries: &Entries) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(storage_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
    let json = serde_json::to_vec_pretty(entries).map_err(storage_err)?;
    tmp.write_all(&json).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

fn storage_err<E: ToString>(err: E) -> StoreError {
    StoreError::Storage {
        reason: err.to_string(),
    }
}
