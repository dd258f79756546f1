// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store wrappers shared by integration tests.

use confmgr::domain::{ConfmgrError, KeyKind, Result};
use confmgr::ports::KeyStore;
use confmgr::adapters::MemoryStore;
use std::collections::HashMap;

/// Wraps a `MemoryStore` and reports one key as holding a type with no
/// `KeyKind`, the way Redis does for sets and sorted sets.
#[allow(dead_code)]
pub struct OddTypeStore {
    inner: MemoryStore,
    odd_key: String,
}

#[allow(dead_code)]
impl OddTypeStore {
    pub fn new(inner: MemoryStore, odd_key: &str) -> Self {
        Self {
            inner,
            odd_key: odd_key.to_string(),
        }
    }
}

impl KeyStore for OddTypeStore {
    fn name(&self) -> &str {
        "odd-type"
    }

    fn probe_kind(&mut self, key: &str) -> Result<KeyKind> {
        if key == self.odd_key {
            return Err(ConfmgrError::UnsupportedKeyType {
                key: key.to_string(),
                kind: "zset".to_string(),
            });
        }
        self.inner.probe_kind(key)
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        self.inner.exists(key)
    }

    fn get_scalar(&mut self, key: &str) -> Result<String> {
        self.inner.get_scalar(key)
    }

    fn set_scalar(&mut self, key: &str, value: &str) -> Result<()> {
        self.inner.set_scalar(key, value)
    }

    fn get_hash(&mut self, key: &str) -> Result<HashMap<String, String>> {
        self.inner.get_hash(key)
    }

    fn set_hash(&mut self, key: &str, fields: &HashMap<String, String>) -> Result<()> {
        self.inner.set_hash(key, fields)
    }

    fn get_hash_field(&mut self, key: &str, field: &str) -> Result<String> {
        self.inner.get_hash_field(key, field)
    }

    fn set_hash_field(&mut self, key: &str, field: &str, value: &str) -> Result<()> {
        self.inner.set_hash_field(key, field, value)
    }

    fn hash_field_exists(&mut self, key: &str, field: &str) -> Result<bool> {
        self.inner.hash_field_exists(key, field)
    }

    fn get_list(&mut self, key: &str) -> Result<Vec<String>> {
        self.inner.get_list(key)
    }

    fn set_list(&mut self, key: &str, entries: &[String]) -> Result<()> {
        self.inner.set_list(key, entries)
    }

    fn append_list(&mut self, key: &str, value: &str) -> Result<()> {
        self.inner.append_list(key, value)
    }

    fn delete_key(&mut self, key: &str) -> Result<()> {
        self.inner.delete_key(key)
    }

    fn list_keys(&mut self, filter: &str) -> Result<Vec<String>> {
        self.inner.list_keys(filter)
    }
}
