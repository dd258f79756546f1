// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provenance-tagged lookup results and storable values.
//!
//! Every resolved leaf value travels with the absolute key it was read from,
//! so callers can always tell which configuration layer produced an answer.

use crate::domain::errors::{ConfmgrError, Result};
use crate::domain::KeyKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A resolved value together with the absolute key it came from.
///
/// An empty `ValueSource` (empty value and empty source) is what a scalar
/// lookup returns when no candidate key exists.
///
/// # Examples
///
/// ```
/// use confmgr::domain::ValueSource;
///
/// let value = ValueSource::new("east1", "cfg:site/east:db");
/// assert_eq!(value.value, "east1");
/// assert!(!value.is_empty());
/// assert!(ValueSource::default().is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSource {
    /// The resolved value
    pub value: String,
    /// The absolute key the value was read from
    pub source: String,
}

impl ValueSource {
    /// Creates a new `ValueSource`.
    pub fn new(value: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if no key contributed this value.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// The answer to a lookup.
///
/// Serializes as `{"type": "<kind>", "data": ...}` where the type tag equals
/// the [`KeyKind`] the result represents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum LookupResult {
    /// A single scalar value
    String(ValueSource),
    /// Merged hash fields
    Hash(BTreeMap<String, ValueSource>),
    /// Concatenated list entries
    List(Vec<ValueSource>),
}

impl LookupResult {
    /// Returns the kind this result represents.
    pub fn kind(&self) -> KeyKind {
        match self {
            LookupResult::String(_) => KeyKind::String,
            LookupResult::Hash(_) => KeyKind::Hash,
            LookupResult::List(_) => KeyKind::List,
        }
    }

    /// Returns `true` if nothing was found.
    pub fn is_empty(&self) -> bool {
        match self {
            LookupResult::String(value) => value.is_empty(),
            LookupResult::Hash(fields) => fields.is_empty(),
            LookupResult::List(entries) => entries.is_empty(),
        }
    }

    /// Renders the result as plain text without provenance.
    ///
    /// Scalars render as their value, hashes as `field: value` lines in field
    /// order and lists as one value per line.
    ///
    /// # Examples
    ///
    /// ```
    /// use confmgr::domain::{LookupResult, ValueSource};
    ///
    /// let list = LookupResult::List(vec![
    ///     ValueSource::new("x", "cfg:a:servers"),
    ///     ValueSource::new("y", "cfg:b:servers"),
    /// ]);
    /// assert_eq!(list.to_text(), "x\ny");
    /// ```
    pub fn to_text(&self) -> String {
        match self {
            LookupResult::String(value) => value.value.clone(),
            LookupResult::Hash(fields) => fields
                .iter()
                .map(|(field, value)| format!("{}: {}", field, value.value))
                .collect::<Vec<_>>()
                .join("\n"),
            LookupResult::List(entries) => entries
                .iter()
                .map(|entry| entry.value.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Renders the result as JSON, including provenance.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ConfmgrError::ParseError {
            message: format!("Failed to encode lookup result: {}", e),
            source: Some(Box::new(e)),
        })
    }
}

/// A value as written to the store.
///
/// This is the typed form of the `{"type": ..., "data": ...}` payloads used
/// to seed the store.
///
/// # Examples
///
/// ```
/// use confmgr::domain::{KeyKind, StoredValue};
///
/// let value = StoredValue::from_json(r#"{"type": "list", "data": ["a", "b"]}"#).unwrap();
/// assert_eq!(value.kind(), KeyKind::List);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StoredValue {
    /// A plain string
    String(String),
    /// A field map
    Hash(HashMap<String, String>),
    /// An ordered list
    List(Vec<String>),
}

impl StoredValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> KeyKind {
        match self {
            StoredValue::String(_) => KeyKind::String,
            StoredValue::Hash(_) => KeyKind::Hash,
            StoredValue::List(_) => KeyKind::List,
        }
    }

    /// Decodes a value from its JSON payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| ConfmgrError::ParseError {
            message: format!("Invalid stored value payload: {}", e),
            source: Some(Box::new(e)),
        })
    }
}
