// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scope-aware lookups with precedence merging.
//!
//! Every lookup follows the same pattern: resolve the search path for the
//! request scope, keep the candidate keys that hold the wanted kind, then fetch
//! and combine them from lowest to highest precedence so that later candidates
//! override earlier ones.

use crate::domain::{resolve_paths, ConfmgrError, KeyKind, Result, Scope, Settings, ValueSource};
use crate::ports::KeyStore;
use std::collections::BTreeMap;

/// The lookup engine for one request.
///
/// The engine borrows the static settings and the store checked out for the
/// request. It keeps no state between calls and caches nothing: every lookup,
/// including those triggered by `${...}` substitution, goes back to the store.
///
/// # Examples
///
/// ```rust
/// use confmgr::adapters::MemoryStore;
/// use confmgr::domain::{Scope, Settings};
/// use confmgr::service::LookupEngine;
///
/// # fn main() -> confmgr::domain::Result<()> {
/// let settings = Settings {
///     key_paths: vec!["site/%{site}".to_string(), "default".to_string()],
///     ..Settings::default()
/// };
/// let mut store = MemoryStore::new()
///     .with_scalar("cfg:site/east:motd", "hello east")
///     .with_scalar("cfg:default:motd", "hello");
/// let scope: Scope = [("site", "east")].into_iter().collect();
///
/// let mut engine = LookupEngine::new(&settings, &mut store);
/// let motd = engine.lookup_scalar("motd", &scope)?;
/// assert_eq!(motd.value, "hello east");
/// assert_eq!(motd.source, "cfg:site/east:motd");
/// # Ok(())
/// # }
/// ```
pub struct LookupEngine<'a, S: KeyStore + ?Sized> {
    pub(crate) settings: &'a Settings,
    pub(crate) store: &'a mut S,
}

impl<'a, S: KeyStore + ?Sized> LookupEngine<'a, S> {
    /// Creates an engine over a checked-out store.
    pub fn new(settings: &'a Settings, store: &'a mut S) -> Self {
        Self { settings, store }
    }

    /// Returns the absolute keys of the wanted kind, lowest precedence first.
    ///
    /// `paths` must already be in precedence order, as returned by
    /// [`resolve_paths`]. Candidates that are absent or hold another kind are
    /// skipped. A failed probe also skips its candidate, unless the store
    /// reports a connectivity failure, which is returned as an error.
    pub fn existing_keys<P: AsRef<str>>(
        &mut self,
        key: &str,
        wanted: KeyKind,
        paths: &[P],
    ) -> Result<Vec<String>> {
        let mut found = Vec::new();

        for path in paths {
            let name = self.settings.absolute_key(path.as_ref(), key);
            tracing::trace!("Probing candidate key '{}'", name);

            match self.store.probe_kind(&name) {
                Ok(kind) if kind == wanted => found.push(name),
                Ok(kind) => {
                    tracing::trace!("Skipping '{}': holds {}, wanted {}", name, kind, wanted);
                }
                Err(e) if e.is_connectivity() => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        "Error probing '{}' on store '{}': {}",
                        name,
                        self.store.name(),
                        e
                    );
                }
            }
        }

        Ok(found)
    }

    /// Resolves the search path for `scope` and returns the matching keys.
    pub fn candidate_keys(&mut self, key: &str, wanted: KeyKind, scope: &Scope) -> Result<Vec<String>> {
        let paths = resolve_paths(&self.settings.key_paths, scope);
        self.existing_keys(key, wanted, &paths)
    }

    /// Looks up a scalar value.
    ///
    /// The highest-precedence string key wins. Its value is expanded before it
    /// is returned. If no candidate exists the result is an empty
    /// [`ValueSource`]; this is not an error.
    pub fn lookup_scalar(&mut self, key: &str, scope: &Scope) -> Result<ValueSource> {
        self.scalar_at(key, scope, 0)
    }

    /// Looks up a hash, merging fields across the search path.
    ///
    /// Fields from higher-precedence hashes override the same fields from
    /// lower-precedence ones; fields defined only once survive untouched. Every
    /// value is expanded. An empty map means nothing was found.
    pub fn lookup_hash(&mut self, key: &str, scope: &Scope) -> Result<BTreeMap<String, ValueSource>> {
        self.hash_at(key, scope, 0)
    }

    /// Looks up a single hash field.
    ///
    /// Only hashes that contain the field contribute, and the
    /// highest-precedence one wins. Unlike [`lookup_scalar`](Self::lookup_scalar),
    /// finding no such hash is an error:
    /// [`ConfmgrError::HashFieldNotFound`].
    pub fn lookup_hash_field(&mut self, key: &str, field: &str, scope: &Scope) -> Result<ValueSource> {
        self.hash_field_at(key, field, scope, 0)
    }

    /// Looks up a list by concatenating every list on the search path.
    ///
    /// Lists are appended in precedence-scan order (lowest first) rather than
    /// overridden. Entries are returned as stored, without expansion.
    pub fn lookup_list(&mut self, key: &str, scope: &Scope) -> Result<Vec<ValueSource>> {
        let mut entries = Vec::new();

        for name in self.candidate_keys(key, KeyKind::List, scope)? {
            let values = self.store.get_list(&name)?;
            entries.extend(values.into_iter().map(|value| ValueSource::new(value, name.as_str())));
        }

        tracing::debug!("List lookup '{}' [{}]: {} entries", key, scope, entries.len());
        Ok(entries)
    }

    /// Looks up one entry of the concatenated list.
    ///
    /// The selected entry is expanded before it is returned.
    pub fn lookup_list_index(&mut self, key: &str, index: i64, scope: &Scope) -> Result<ValueSource> {
        self.list_index_at(key, index, scope, 0)
    }

    pub(crate) fn scalar_at(&mut self, key: &str, scope: &Scope, depth: usize) -> Result<ValueSource> {
        let mut result = ValueSource::default();

        for name in self.candidate_keys(key, KeyKind::String, scope)? {
            let raw = self.store.get_scalar(&name)?;
            let value = self.expand_at(&raw, scope, depth)?;
            result = ValueSource::new(value, name);
        }

        tracing::debug!("Scalar lookup '{}' [{}]: source '{}'", key, scope, result.source);
        Ok(result)
    }

    pub(crate) fn hash_at(
        &mut self,
        key: &str,
        scope: &Scope,
        depth: usize,
    ) -> Result<BTreeMap<String, ValueSource>> {
        let mut merged = BTreeMap::new();

        for name in self.candidate_keys(key, KeyKind::Hash, scope)? {
            let fields = self.store.get_hash(&name)?;
            for (field, raw) in fields {
                let value = self.expand_at(&raw, scope, depth)?;
                merged.insert(field, ValueSource::new(value, name.as_str()));
            }
        }

        tracing::debug!("Hash lookup '{}' [{}]: {} fields", key, scope, merged.len());
        Ok(merged)
    }

    pub(crate) fn hash_field_at(
        &mut self,
        key: &str,
        field: &str,
        scope: &Scope,
        depth: usize,
    ) -> Result<ValueSource> {
        let mut result = None;

        for name in self.candidate_keys(key, KeyKind::Hash, scope)? {
            if !self.store.hash_field_exists(&name, field)? {
                continue;
            }
            let raw = self.store.get_hash_field(&name, field)?;
            let value = self.expand_at(&raw, scope, depth)?;
            result = Some(ValueSource::new(value, name));
        }

        result.ok_or_else(|| ConfmgrError::HashFieldNotFound {
            key: key.to_string(),
            field: field.to_string(),
        })
    }

    pub(crate) fn list_index_at(
        &mut self,
        key: &str,
        index: i64,
        scope: &Scope,
        depth: usize,
    ) -> Result<ValueSource> {
        if index < 0 {
            return Err(ConfmgrError::NegativeListIndex {
                key: key.to_string(),
                index,
            });
        }

        let entries = self.lookup_list(key, scope)?;
        let length = entries.len();
        let entry = usize::try_from(index)
            .ok()
            .and_then(|i| entries.into_iter().nth(i))
            .ok_or_else(|| ConfmgrError::ListIndexOutOfRange {
                key: key.to_string(),
                index,
                length,
            })?;

        let value = self.expand_at(&entry.value, scope, depth)?;
        Ok(ValueSource::new(value, entry.source))
    }
}
