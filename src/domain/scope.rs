// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request scope and its extraction from request headers.
//!
//! A [`Scope`] names the dimensions (site, pod, host, ...) a request belongs to.
//! Path templates use it to decide which configuration layers apply.

use std::collections::BTreeMap;
use std::fmt;

/// The per-request mapping of scope variable names to values.
///
/// A scope is built once per request and read only afterwards.
///
/// # Examples
///
/// ```
/// use confmgr::domain::Scope;
///
/// let scope = Scope::from_headers("x-cfg-", [("X-Cfg-Site", "East"), ("Accept", "*/*")]);
/// assert_eq!(scope.get("site"), Some("east"));
/// assert_eq!(scope.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scope(BTreeMap<String, String>);

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Scope(BTreeMap::new())
    }

    /// Extracts a scope from request headers.
    ///
    /// Every header whose name starts with `marker` (compared case-insensitively)
    /// contributes one scope variable. The variable name is the rest of the header
    /// name. Names and values are lower-cased. When a header is repeated, the
    /// first value wins.
    pub fn from_headers<I, K, V>(marker: &str, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let marker = marker.to_lowercase();
        let mut vars = BTreeMap::new();

        for (name, value) in headers {
            let name = name.as_ref().to_lowercase();
            let Some(var) = name.strip_prefix(&marker) else {
                continue;
            };
            if var.is_empty() {
                continue;
            }
            vars.entry(var.to_string())
                .or_insert_with(|| value.as_ref().to_lowercase());
        }

        Scope(vars)
    }

    /// Returns the value of a scope variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns `true` if the variable is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the number of scope variables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the scope defines no variables.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the scope variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Scope
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Scope(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_headers_filters_by_marker() {
        let scope = Scope::from_headers(
            "x-cfg-",
            [
                ("x-cfg-site", "east"),
                ("x-cfg-pod", "p1"),
                ("content-type", "application/json"),
            ],
        );
        assert_eq!(scope.len(), 2);
        assert_eq!(scope.get("site"), Some("east"));
        assert_eq!(scope.get("pod"), Some("p1"));
        assert!(!scope.contains("content-type"));
    }

    #[test]
    fn test_from_headers_is_case_insensitive() {
        let scope = Scope::from_headers("X-CFG-", [("x-Cfg-SITE", "EAST")]);
        assert_eq!(scope.get("site"), Some("east"));
    }

    #[test]
    fn test_from_headers_first_value_wins() {
        let scope = Scope::from_headers("x-cfg-", [("x-cfg-site", "east"), ("X-Cfg-Site", "west")]);
        assert_eq!(scope.get("site"), Some("east"));
    }

    #[test]
    fn test_from_headers_ignores_bare_marker() {
        let scope = Scope::from_headers("x-cfg-", [("x-cfg-", "orphan")]);
        assert!(scope.is_empty());
    }

    #[test]
    fn test_from_iter_and_display() {
        let scope: Scope = [("site", "east"), ("pod", "p1")].into_iter().collect();
        assert_eq!(scope.to_string(), "pod=p1,site=east");
    }
}
