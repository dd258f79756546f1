// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expansion of configured search-path templates against a request scope.
//!
//! A template such as `site/%{site}/pod/%{pod}` names one layer of the
//! configuration hierarchy. Templates whose tokens cannot all be filled from the
//! scope do not apply to the request and are dropped.

use crate::domain::Scope;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%\{(\S+?)\}").expect("token pattern is a valid regex")
});

/// Resolves path templates into concrete path prefixes.
///
/// The result is ordered from lowest to highest precedence, which is the
/// reverse of the configuration order: the first configured template comes
/// last so that override-by-iteration lets it win.
///
/// # Examples
///
/// ```
/// use confmgr::domain::{resolve_paths, Scope};
///
/// let templates = vec!["site/%{site}".to_string(), "pod/%{pod}".to_string(), "default".to_string()];
/// let scope: Scope = [("site", "east")].into_iter().collect();
///
/// assert_eq!(resolve_paths(&templates, &scope), vec!["default", "site/east"]);
/// ```
pub fn resolve_paths<S: AsRef<str>>(templates: &[S], scope: &Scope) -> Vec<String> {
    let mut paths: Vec<String> = templates
        .iter()
        .filter_map(|template| resolve_template(template.as_ref(), scope))
        .collect();
    paths.reverse();
    paths
}

/// Substitutes every `%{name}` token of a single template.
///
/// Returns `None` if any token names a variable the scope does not define.
pub fn resolve_template(template: &str, scope: &Scope) -> Option<String> {
    let mut missing = false;
    let resolved = TOKEN_RE.replace_all(template, |caps: &Captures| match scope.get(&caps[1]) {
        Some(value) => value.to_string(),
        None => {
            missing = true;
            String::new()
        }
    });

    if missing {
        tracing::trace!("Dropping path template '{}': unresolved token", template);
        None
    } else {
        Some(resolved.into_owned())
    }
}
