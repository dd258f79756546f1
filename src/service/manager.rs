// SPDX-License-Identifier: MIT OR Apache-2.0

//! The request-facing configuration manager.
//!
//! `ConfigManager` owns the process settings and a store provider. Every call
//! checks out its own store, runs the lookup, and turns an empty answer into
//! [`ConfmgrError::KeyNotFound`] so that callers see one not-found signal.

use super::lookup::LookupEngine;
use crate::domain::{ConfmgrError, LookupResult, Result, Scope, Settings, StoredValue};
use crate::ports::{KeyStore, StoreProvider};
use std::fs;
use std::path::Path;

/// Counts reported by [`ConfigManager::load_defaults`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Files stored as keys
    pub stored: usize,
    /// Files that could not be read, decoded or stored
    pub skipped: usize,
}

/// The configuration manager.
///
/// # Examples
///
/// ```rust
/// use confmgr::adapters::MemoryStore;
/// use confmgr::domain::{LookupResult, Settings};
/// use confmgr::service::ConfigManager;
///
/// # fn main() -> confmgr::domain::Result<()> {
/// let store = MemoryStore::new().with_list("cfg:default:servers", ["a", "b"]);
/// let manager = ConfigManager::new(Settings::default(), store)?;
///
/// let scope = manager.scope_from_headers([("X-Cfg-Site", "East")]);
/// match manager.lookup_list("servers", &scope)? {
///     LookupResult::List(entries) => assert_eq!(entries.len(), 2),
///     other => panic!("unexpected {:?}", other),
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConfigManager<P: StoreProvider> {
    settings: Settings,
    provider: P,
}

impl<P: StoreProvider> ConfigManager<P> {
    /// Creates a manager after validating `settings`.
    pub fn new(settings: Settings, provider: P) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings, provider })
    }

    /// Returns the settings in effect.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the store provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Builds a request scope from header pairs using the configured marker.
    pub fn scope_from_headers<I, K, V>(&self, headers: I) -> Scope
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Scope::from_headers(&self.settings.hdr_prefix, headers)
    }

    /// Looks up a scalar.
    pub fn lookup_string(&self, key: &str, scope: &Scope) -> Result<LookupResult> {
        let found = self.with_engine(|engine| engine.lookup_scalar(key, scope))?;
        if found.is_empty() {
            return Err(not_found(key));
        }
        Ok(LookupResult::String(found))
    }

    /// Looks up a merged hash.
    pub fn lookup_hash(&self, key: &str, scope: &Scope) -> Result<LookupResult> {
        let fields = self.with_engine(|engine| engine.lookup_hash(key, scope))?;
        if fields.is_empty() {
            return Err(not_found(key));
        }
        Ok(LookupResult::Hash(fields))
    }

    /// Looks up a concatenated list.
    pub fn lookup_list(&self, key: &str, scope: &Scope) -> Result<LookupResult> {
        let entries = self.with_engine(|engine| engine.lookup_list(key, scope))?;
        if entries.is_empty() {
            return Err(not_found(key));
        }
        Ok(LookupResult::List(entries))
    }

    /// Looks up one field of a hash.
    pub fn lookup_hash_field(&self, key: &str, field: &str, scope: &Scope) -> Result<LookupResult> {
        self.with_engine(|engine| engine.lookup_hash_field(key, field, scope))
            .map(LookupResult::String)
    }

    /// Looks up one entry of a list.
    pub fn lookup_list_index(&self, key: &str, index: i64, scope: &Scope) -> Result<LookupResult> {
        self.with_engine(|engine| engine.lookup_list_index(key, index, scope))
            .map(LookupResult::String)
    }

    /// Imports every regular file in `dir` as one key.
    ///
    /// The file name is the key name, prefixed with the configured key prefix
    /// unless it already carries it. The file body is a JSON [`StoredValue`].
    /// Files that cannot be read, decoded or stored are logged and skipped;
    /// only failing to read the directory itself is an error.
    pub fn load_defaults(&self, dir: impl AsRef<Path>) -> Result<LoadReport> {
        let dir = dir.as_ref();
        tracing::info!("Scanning {}", dir.display());

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        let mut store = self.provider.checkout()?;
        let mut report = LoadReport::default();

        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!("Skipping {}: file name is not valid UTF-8", path.display());
                report.skipped += 1;
                continue;
            };
            let key = self.settings.prefixed(file_name);

            match read_value(&path).and_then(|value| KeyStore::store_value(&mut store, &key, &value)) {
                Ok(()) => {
                    tracing::info!("Stored {} from {}", key, path.display());
                    report.stored += 1;
                }
                Err(e) if e.is_connectivity() => return Err(e),
                Err(e) => {
                    tracing::warn!("Cannot store {} from {}: {}", key, path.display(), e);
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    fn with_engine<T>(
        &self,
        f: impl FnOnce(&mut LookupEngine<'_, P::Store>) -> Result<T>,
    ) -> Result<T> {
        let mut store = self.provider.checkout()?;
        let mut engine = LookupEngine::new(&self.settings, &mut store);
        f(&mut engine)
    }
}

fn read_value(path: &Path) -> Result<StoredValue> {
    let payload = fs::read_to_string(path)?;
    StoredValue::from_json(&payload)
}

fn not_found(key: &str) -> ConfmgrError {
    ConfmgrError::KeyNotFound {
        key: key.to_string(),
    }
}
