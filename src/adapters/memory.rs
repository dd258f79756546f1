// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory key-value store adapter.
//!
//! This module provides a thread-safe store backed by a `HashMap`. Clones share
//! the same data, so a `MemoryStore` is also its own [`StoreProvider`].

use crate::domain::{ConfmgrError, KeyKind, Result, StoredValue};
use crate::ports::{KeyStore, StoreProvider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, StoredValue>,
    fetches: HashMap<String, usize>,
    unavailable: bool,
}

/// Key-value store adapter that keeps everything in memory.
///
/// Besides serving as a lightweight backend, the store counts value fetches
/// per key and can pretend to be unreachable, which makes it useful for
/// exercising the lookup engine.
///
/// # Examples
///
/// ```rust
/// use confmgr::adapters::MemoryStore;
/// use confmgr::ports::KeyStore;
///
/// let mut store = MemoryStore::new();
/// store.append_list("cfg:default:servers", "a").unwrap();
/// store.append_list("cfg:default:servers", "b").unwrap();
///
/// assert_eq!(store.get_list("cfg:default:servers").unwrap(), vec!["a", "b"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, consuming and returning the store.
    pub fn with_value(self, key: impl Into<String>, value: StoredValue) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.entries.insert(key.into(), value);
        }
        self
    }

    /// Adds a string value, consuming and returning the store.
    pub fn with_scalar(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_value(key, StoredValue::String(value.into()))
    }

    /// Adds a hash value, consuming and returning the store.
    pub fn with_hash<I, F, V>(self, key: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(f, v)| (f.into(), v.into()))
            .collect();
        self.with_value(key, StoredValue::Hash(fields))
    }

    /// Adds a list value, consuming and returning the store.
    pub fn with_list<I, V>(self, key: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let entries = entries.into_iter().map(Into::into).collect();
        self.with_value(key, StoredValue::List(entries))
    }

    /// Makes every subsequent operation fail as if the backend were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = unavailable;
        }
    }

    /// Returns how many times the value at `key` was fetched.
    pub fn fetch_count(&self, key: &str) -> usize {
        self.state
            .lock()
            .map(|state| state.fetches.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Returns a copy of the value stored at `key`.
    pub fn value(&self, key: &str) -> Option<StoredValue> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.entries.get(key).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        let state = self.state.lock().map_err(|_| ConfmgrError::Backend {
            backend: "memory".to_string(),
            message: "Store lock poisoned".to_string(),
            source: None,
        })?;
        if state.unavailable {
            return Err(ConfmgrError::BackendUnavailable {
                backend: "memory".to_string(),
                message: "Store marked unavailable".to_string(),
                source: None,
            });
        }
        Ok(state)
    }

    fn fetch(&self, key: &str) -> Result<Option<StoredValue>> {
        let mut state = self.lock()?;
        *state.fetches.entry(key.to_string()).or_insert(0) += 1;
        Ok(state.entries.get(key).cloned())
    }

    fn wrong_kind(key: &str, wanted: KeyKind, found: KeyKind) -> ConfmgrError {
        ConfmgrError::Backend {
            backend: "memory".to_string(),
            message: format!("Key {} holds a {} value, not a {}", key, found, wanted),
            source: None,
        }
    }
}

impl KeyStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn probe_kind(&mut self, key: &str) -> Result<KeyKind> {
        let state = self.lock()?;
        Ok(state
            .entries
            .get(key)
            .map(StoredValue::kind)
            .unwrap_or(KeyKind::NotFound))
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.lock()?.entries.contains_key(key))
    }

    fn get_scalar(&mut self, key: &str) -> Result<String> {
        match self.fetch(key)? {
            Some(StoredValue::String(value)) => Ok(value),
            Some(other) => Err(Self::wrong_kind(key, KeyKind::String, other.kind())),
            None => Err(Self::wrong_kind(key, KeyKind::String, KeyKind::NotFound)),
        }
    }

    fn set_scalar(&mut self, key: &str, value: &str) -> Result<()> {
        self.lock()?
            .entries
            .insert(key.to_string(), StoredValue::String(value.to_string()));
        Ok(())
    }

    fn get_hash(&mut self, key: &str) -> Result<HashMap<String, String>> {
        match self.fetch(key)? {
            Some(StoredValue::Hash(fields)) => Ok(fields),
            Some(other) => Err(Self::wrong_kind(key, KeyKind::Hash, other.kind())),
            // a missing hash reads as empty
            None => Ok(HashMap::new()),
        }
    }

    fn set_hash(&mut self, key: &str, fields: &HashMap<String, String>) -> Result<()> {
        self.lock()?
            .entries
            .insert(key.to_string(), StoredValue::Hash(fields.clone()));
        Ok(())
    }

    fn get_hash_field(&mut self, key: &str, field: &str) -> Result<String> {
        match self.fetch(key)? {
            Some(StoredValue::Hash(fields)) => {
                fields.get(field).cloned().ok_or_else(|| ConfmgrError::Backend {
                    backend: "memory".to_string(),
                    message: format!("Field {} missing from hash {}", field, key),
                    source: None,
                })
            }
            Some(other) => Err(Self::wrong_kind(key, KeyKind::Hash, other.kind())),
            None => Err(Self::wrong_kind(key, KeyKind::Hash, KeyKind::NotFound)),
        }
    }

    fn set_hash_field(&mut self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut state = self.lock()?;
        let entry = state
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue::Hash(HashMap::new()));
        match entry {
            StoredValue::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            other => Err(Self::wrong_kind(key, KeyKind::Hash, other.kind())),
        }
    }

    fn hash_field_exists(&mut self, key: &str, field: &str) -> Result<bool> {
        let state = self.lock()?;
        Ok(matches!(
            state.entries.get(key),
            Some(StoredValue::Hash(fields)) if fields.contains_key(field)
        ))
    }

    fn get_list(&mut self, key: &str) -> Result<Vec<String>> {
        match self.fetch(key)? {
            Some(StoredValue::List(entries)) => Ok(entries),
            Some(other) => Err(Self::wrong_kind(key, KeyKind::List, other.kind())),
            None => Ok(Vec::new()),
        }
    }

    fn set_list(&mut self, key: &str, entries: &[String]) -> Result<()> {
        self.lock()?
            .entries
            .insert(key.to_string(), StoredValue::List(entries.to_vec()));
        Ok(())
    }

    fn append_list(&mut self, key: &str, value: &str) -> Result<()> {
        let mut state = self.lock()?;
        let entry = state
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue::List(Vec::new()));
        match entry {
            StoredValue::List(entries) => {
                entries.push(value.to_string());
                Ok(())
            }
            other => Err(Self::wrong_kind(key, KeyKind::List, other.kind())),
        }
    }

    fn delete_key(&mut self, key: &str) -> Result<()> {
        self.lock()?.entries.remove(key);
        Ok(())
    }

    fn list_keys(&mut self, filter: &str) -> Result<Vec<String>> {
        let filter = if filter.is_empty() { "*" } else { filter };
        let pattern = glob::Pattern::new(filter).map_err(|e| {
            ConfmgrError::backend("memory", format!("Invalid key filter '{}'", filter), e)
        })?;

        let state = self.lock()?;
        let mut keys: Vec<String> = state
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

impl StoreProvider for MemoryStore {
    type Store = MemoryStore;

    fn checkout(&self) -> Result<Self::Store> {
        Ok(self.clone())
    }
}
