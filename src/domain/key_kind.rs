// SPDX-License-Identifier: MIT OR Apache-2.0

//! The kind of value stored under a key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The kind of value stored under an absolute key name.
///
/// `KeyKind` mirrors the store's native type system. [`KeyKind::NotFound`] is a
/// regular outcome of probing a key, never an error.
///
/// # Examples
///
/// ```
/// use confmgr::domain::KeyKind;
///
/// let kind: KeyKind = "hash".parse().unwrap();
/// assert_eq!(kind, KeyKind::Hash);
/// assert_eq!(KeyKind::NotFound.as_str(), "none");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// The key does not exist.
    #[serde(rename = "none")]
    NotFound,
    /// A plain string value.
    String,
    /// An ordered list of strings.
    List,
    /// A mapping of field names to strings.
    Hash,
}

impl KeyKind {
    /// Returns the textual tag of this kind (`none`, `string`, `list`, `hash`).
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::NotFound => "none",
            KeyKind::String => "string",
            KeyKind::List => "list",
            KeyKind::Hash => "hash",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a type tag does not name a [`KeyKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key kind '{0}'")]
pub struct UnknownKeyKind(pub String);

impl FromStr for KeyKind {
    type Err = UnknownKeyKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(KeyKind::NotFound),
            "string" => Ok(KeyKind::String),
            "list" => Ok(KeyKind::List),
            "hash" => Ok(KeyKind::Hash),
            other => Err(UnknownKeyKind(other.to_string())),
        }
    }
}
