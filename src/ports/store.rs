// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store trait definition.
//!
//! This module defines the `KeyStore` trait, the port through which the lookup
//! engine reads typed values. Any backend that can hold strings, hashes and
//! lists under string keys can implement it.

use crate::domain::{KeyKind, Result, StoredValue};
use std::collections::HashMap;

/// A trait for typed key-value stores.
///
/// A `KeyStore` is a single checked-out handle to a backend, used by one
/// request at a time. Methods take `&mut self` because a handle usually wraps
/// a live connection.
///
/// Every method may fail with a backend error. Implementations must report
/// connectivity failures as
/// [`ConfmgrError::BackendUnavailable`](crate::domain::ConfmgrError::BackendUnavailable)
/// so that candidate scanning can tell them apart from ordinary probe errors.
///
/// # Examples
///
/// ```rust
/// use confmgr::adapters::MemoryStore;
/// use confmgr::domain::KeyKind;
/// use confmgr::ports::KeyStore;
///
/// let mut store = MemoryStore::new();
/// store.set_scalar("cfg:default:name", "confmgr").unwrap();
///
/// assert_eq!(store.probe_kind("cfg:default:name").unwrap(), KeyKind::String);
/// assert_eq!(store.probe_kind("cfg:default:other").unwrap(), KeyKind::NotFound);
/// ```
pub trait KeyStore: Send {
    /// Returns the name of this store, used in logs and error messages.
    fn name(&self) -> &str;

    /// Returns the kind of value stored under `key`.
    fn probe_kind(&mut self, key: &str) -> Result<KeyKind>;

    /// Returns `true` if `key` exists.
    fn exists(&mut self, key: &str) -> Result<bool>;

    /// Reads a string value.
    fn get_scalar(&mut self, key: &str) -> Result<String>;

    /// Writes a string value, replacing whatever was stored.
    fn set_scalar(&mut self, key: &str, value: &str) -> Result<()>;

    /// Reads every field of a hash.
    fn get_hash(&mut self, key: &str) -> Result<HashMap<String, String>>;

    /// Replaces a hash with exactly the given fields.
    fn set_hash(&mut self, key: &str, fields: &HashMap<String, String>) -> Result<()>;

    /// Reads a single hash field.
    fn get_hash_field(&mut self, key: &str, field: &str) -> Result<String>;

    /// Writes a single hash field, creating the hash if needed.
    fn set_hash_field(&mut self, key: &str, field: &str, value: &str) -> Result<()>;

    /// Returns `true` if the hash at `key` exists and has `field`.
    fn hash_field_exists(&mut self, key: &str, field: &str) -> Result<bool>;

    /// Reads a whole list in order.
    fn get_list(&mut self, key: &str) -> Result<Vec<String>>;

    /// Replaces a list with exactly the given entries.
    fn set_list(&mut self, key: &str, entries: &[String]) -> Result<()>;

    /// Appends one entry to a list, creating it if needed.
    fn append_list(&mut self, key: &str, value: &str) -> Result<()>;

    /// Deletes a key of any kind. Deleting a missing key is not an error.
    fn delete_key(&mut self, key: &str) -> Result<()>;

    /// Lists keys matching a glob filter. An empty filter matches every key.
    fn list_keys(&mut self, filter: &str) -> Result<Vec<String>>;

    /// Writes a typed value, replacing whatever was stored.
    fn store_value(&mut self, key: &str, value: &StoredValue) -> Result<()> {
        match value {
            StoredValue::String(s) => self.set_scalar(key, s),
            StoredValue::Hash(fields) => self.set_hash(key, fields),
            StoredValue::List(entries) => self.set_list(key, entries),
        }
    }
}

/// A trait for handing out stores, one per request.
///
/// This replaces any process-wide backend factory: the provider is passed to
/// whatever serves requests, and each request checks out its own store.
pub trait StoreProvider: Send + Sync {
    /// The store type handed out.
    type Store: KeyStore;

    /// Checks out a store for the duration of one request.
    ///
    /// Bounded providers may block here until a store becomes available.
    fn checkout(&self) -> Result<Self::Store>;
}
