// Accessbar persistence adapter
// Write-through mirror of every persisted preference under a namespace prefix.
// Storage failures never reach callers: the adapter logs once and continues in memory only.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::types::errors::StorageError;
use crate::types::preferences::{PrefValue, PreferenceKey, PreferenceSnapshot};

/// Synchronous string key/value backend, shaped like `localStorage`.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory backend. Can simulate a quota or an unavailable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses writes once stored keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self { quota_bytes: Some(bytes), ..Self::default() }
    }

    /// Every operation fails, like storage in some private browsing modes.
    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Self::default() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable {
            Err(StorageError::Unavailable("storage disabled".to_string()))
        } else {
            Ok(())
        }
    }

    fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if let Some(quota) = self.quota_bytes {
            let existing = self.items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = self.used_bytes() - existing + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded(format!(
                    "{} bytes needed, {} allowed",
                    needed, quota
                )));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check_available()?;
        Ok(self.items.keys().cloned().collect())
    }
}

pub struct PersistenceAdapter {
    storage: Box<dyn KeyValueStorage>,
    prefix: String,
    degraded: bool,
}

impl PersistenceAdapter {
    pub fn new(storage: Box<dyn KeyValueStorage>, prefix: &str) -> Self {
        Self { storage, prefix: prefix.to_string(), degraded: false }
    }

    /// Adapter over a fresh [`MemoryStorage`].
    pub fn in_memory(prefix: &str) -> Self {
        Self::new(Box::new(MemoryStorage::new()), prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn storage_key(&self, key: PreferenceKey) -> String {
        format!("{}{}", self.prefix, key.name())
    }

    /// Hands the backing storage back, for callers that abandon this adapter.
    pub fn into_storage(self) -> Box<dyn KeyValueStorage> {
        self.storage
    }

    /// Whether a storage failure switched the adapter to in-memory-only operation.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn degrade(&mut self, err: &StorageError) {
        if !self.degraded {
            warn!(error = %err, "preference storage failed, continuing in memory only");
            self.degraded = true;
        }
    }

    /// Reads every persisted preference present in storage.
    ///
    /// Missing keys are absent from the result; unparseable values are logged and skipped.
    pub fn load(&mut self) -> PreferenceSnapshot {
        let mut snapshot = PreferenceSnapshot::new();
        for key in PreferenceKey::all().filter(|k| k.is_persisted()) {
            let storage_key = self.storage_key(key);
            match self.storage.get_item(&storage_key) {
                Ok(Some(raw)) => match key.domain().parse_stored(&raw) {
                    Some(value) => {
                        snapshot.insert(key, value);
                    }
                    None => warn!(key = %storage_key, raw = %raw, "ignoring malformed persisted value"),
                },
                Ok(None) => {}
                Err(err) => {
                    self.degrade(&err);
                    break;
                }
            }
        }
        snapshot
    }

    /// Mirrors one value. Never fails; transient preferences are not written.
    pub fn save(&mut self, key: PreferenceKey, value: &PrefValue) {
        if !key.is_persisted() || self.degraded {
            return;
        }
        let storage_key = self.storage_key(key);
        if let Err(err) = self.storage.set_item(&storage_key, &value.to_storage_string()) {
            self.degrade(&err);
        }
    }

    /// Removes every key under the namespace prefix, including keys this version does not know.
    /// Returns how many keys were removed.
    pub fn clear_all(&mut self) -> usize {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(err) => {
                self.degrade(&err);
                return 0;
            }
        };
        let owned: Vec<String> = keys
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .collect();
        let mut removed = 0;
        for key in &owned {
            match self.storage.remove_item(key) {
                Ok(()) => removed += 1,
                Err(err) => self.degrade(&err),
            }
        }
        info!(removed, prefix = %self.prefix, "cleared persisted preferences");
        removed
    }

    /// Raw access for diagnostics and tests.
    pub fn raw(&self, key: PreferenceKey) -> Option<String> {
        self.storage.get_item(&self.storage_key(key)).ok().flatten()
    }
}
