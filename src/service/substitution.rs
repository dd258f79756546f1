// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recursive `${...}` expansion of looked-up values.
//!
//! A value may reference other configuration with three forms:
//!
//! - `${name/index/N}` selects entry `N` of the list `name`
//! - `${name/field}` selects `field` of the hash `name`
//! - `${name}` selects the scalar `name`
//!
//! References are resolved through the same scope-aware lookups as the outer
//! request, so nested references expand recursively.

use super::lookup::LookupEngine;
use crate::domain::{ConfmgrError, Result, Scope};
use crate::ports::KeyStore;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static SCAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^{}\s]+)\}").expect("reference pattern is a valid regex")
});

static LIST_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+)/index/(-?\d+)$").expect("list index pattern is a valid regex")
});

/// A parsed `${...}` reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// `${name/index/N}`
    ListIndex {
        /// The list's base key
        key: String,
        /// The requested position
        index: i64,
    },
    /// `${name/field}`
    HashField {
        /// The hash's base key
        key: String,
        /// The requested field
        field: String,
    },
    /// `${name}`
    Scalar {
        /// The scalar's base key
        key: String,
    },
}

impl Reference {
    /// Parses the text between `${` and `}`.
    ///
    /// Returns `None` for malformed references, which are then left in the
    /// value untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use confmgr::service::Reference;
    ///
    /// assert_eq!(
    ///     Reference::parse("servers/index/2"),
    ///     Some(Reference::ListIndex { key: "servers".to_string(), index: 2 })
    /// );
    /// assert_eq!(
    ///     Reference::parse("db/host"),
    ///     Some(Reference::HashField { key: "db".to_string(), field: "host".to_string() })
    /// );
    /// assert_eq!(Reference::parse("/host"), None);
    /// ```
    pub fn parse(inner: &str) -> Option<Self> {
        if let Some(caps) = LIST_INDEX_RE.captures(inner) {
            let index = caps[2].parse().ok()?;
            return Some(Reference::ListIndex {
                key: caps[1].to_string(),
                index,
            });
        }

        match inner.split_once('/') {
            Some((key, field)) if !key.is_empty() && !field.is_empty() => Some(Reference::HashField {
                key: key.to_string(),
                field: field.to_string(),
            }),
            Some(_) => None,
            None => Some(Reference::Scalar {
                key: inner.to_string(),
            }),
        }
    }
}

impl<'a, S: KeyStore + ?Sized> LookupEngine<'a, S> {
    /// Expands every `${...}` reference in `value`.
    ///
    /// Each distinct reference is looked up once, then every occurrence of it
    /// is replaced. A missing scalar expands to the empty string; any other
    /// lookup failure aborts the expansion.
    pub fn expand(&mut self, value: &str, scope: &Scope) -> Result<String> {
        self.expand_at(value, scope, 0)
    }

    pub(crate) fn expand_at(&mut self, value: &str, scope: &Scope, depth: usize) -> Result<String> {
        let mut tokens: Vec<(&str, Reference)> = Vec::new();
        for caps in SCAN_RE.captures_iter(value) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if tokens.iter().any(|(text, _)| *text == whole.as_str()) {
                continue;
            }
            if let Some(reference) = Reference::parse(inner.as_str()) {
                tokens.push((whole.as_str(), reference));
            }
        }

        if tokens.is_empty() {
            return Ok(value.to_string());
        }

        if depth >= self.settings.max_substitution_depth {
            return Err(ConfmgrError::SubstitutionCycle {
                reference: tokens[0].0.to_string(),
                depth,
            });
        }

        let mut resolved = HashMap::with_capacity(tokens.len());
        for (text, reference) in tokens {
            tracing::trace!("Expanding '{}' at depth {}", text, depth);
            let replacement = self.resolve_reference(&reference, scope, depth + 1)?;
            resolved.insert(text, replacement);
        }

        let expanded = SCAN_RE.replace_all(value, |caps: &Captures| {
            let text = caps.get(0).map_or("", |m| m.as_str());
            resolved
                .get(text)
                .cloned()
                .unwrap_or_else(|| text.to_string())
        });

        Ok(expanded.into_owned())
    }

    fn resolve_reference(&mut self, reference: &Reference, scope: &Scope, depth: usize) -> Result<String> {
        let found = match reference {
            Reference::ListIndex { key, index } => self.list_index_at(key, *index, scope, depth)?,
            Reference::HashField { key, field } => self.hash_field_at(key, field, scope, depth)?,
            Reference::Scalar { key } => self.scalar_at(key, scope, depth)?,
        };
        Ok(found.value)
    }
}
