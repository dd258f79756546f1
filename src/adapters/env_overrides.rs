// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable overrides for settings.
//!
//! Variables named `<prefix><FIELD>` replace individual [`Settings`] fields.
//! With the default `CONFMGR_` prefix the recognized variables are:
//!
//! | Variable | Field |
//! |---|---|
//! | `CONFMGR_KEY_PATHS` | `key_paths` (comma-separated) |
//! | `CONFMGR_KEY_PREFIX` | `key_prefix` |
//! | `CONFMGR_HDR_PREFIX` | `hdr_prefix` |
//! | `CONFMGR_MAX_SUBSTITUTION_DEPTH` | `max_substitution_depth` |
//! | `CONFMGR_REDIS_URL` | `redis.url` |
//! | `CONFMGR_REDIS_MAX_IDLE` | `redis.max_idle` |
//! | `CONFMGR_REDIS_MAX_ACTIVE` | `redis.max_active` |

use crate::domain::{ConfmgrError, Result, Settings};
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::str::FromStr;

/// Default prefix of overriding variables.
pub const DEFAULT_ENV_PREFIX: &str = "CONFMGR_";

/// Maximum length for environment variable values
const MAX_ENV_VALUE_LEN: usize = 64 * 1024;

/// Applies environment overrides to settings.
///
/// # Examples
///
/// ```rust
/// use confmgr::adapters::EnvOverrides;
/// use confmgr::domain::Settings;
/// use std::collections::HashMap;
///
/// let mut values = HashMap::new();
/// values.insert("KEY_PATHS".to_string(), "host/%{host}, default".to_string());
///
/// let mut settings = Settings::default();
/// EnvOverrides::with_values(values).apply(&mut settings).unwrap();
/// assert_eq!(settings.key_paths, vec!["host/%{host}", "default"]);
/// ```
#[derive(Debug, Clone)]
pub struct EnvOverrides {
    /// Prefix stripped from variable names
    prefix: String,
    /// Fixed values used instead of the process environment
    values: Option<HashMap<String, String>>,
}

impl EnvOverrides {
    /// Reads overrides from variables starting with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            values: None,
        }
    }

    /// Uses fixed values, keyed by field name without the prefix.
    ///
    /// This is meant for tests, which should not mutate the process environment.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            prefix: String::new(),
            values: Some(values),
        }
    }

    /// Overrides the fields of `settings` that have a variable set.
    ///
    /// Fails with [`ConfmgrError::InvalidSettings`] if a numeric variable does
    /// not parse.
    pub fn apply(&self, settings: &mut Settings) -> Result<()> {
        let vars = self.load();

        if let Some(paths) = vars.get("KEY_PATHS") {
            settings.key_paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(prefix) = vars.get("KEY_PREFIX") {
            settings.key_prefix = prefix.clone();
        }
        if let Some(prefix) = vars.get("HDR_PREFIX") {
            settings.hdr_prefix = prefix.clone();
        }
        if let Some(depth) = vars.get("MAX_SUBSTITUTION_DEPTH") {
            settings.max_substitution_depth = self.parse_number("MAX_SUBSTITUTION_DEPTH", depth)?;
        }
        if let Some(url) = vars.get("REDIS_URL") {
            settings.redis.url = url.clone();
        }
        if let Some(idle) = vars.get("REDIS_MAX_IDLE") {
            settings.redis.max_idle = self.parse_number("REDIS_MAX_IDLE", idle)?;
        }
        if let Some(active) = vars.get("REDIS_MAX_ACTIVE") {
            settings.redis.max_active = self.parse_number("REDIS_MAX_ACTIVE", active)?;
        }

        Ok(())
    }

    fn load(&self) -> HashMap<String, String> {
        if let Some(values) = &self.values {
            return values.clone();
        }

        let vars = select_prefixed(&self.prefix, env::vars_os());
        tracing::debug!("Loaded {} settings overrides (prefix={})", vars.len(), self.prefix);
        vars
    }

    fn parse_number<T: FromStr>(&self, field: &str, raw: &str) -> Result<T> {
        raw.trim().parse().map_err(|_| ConfmgrError::InvalidSettings {
            message: format!("{}{} is not a valid number: '{}'", self.prefix, field, raw),
        })
    }
}

/// Keeps the variables starting with `prefix`, keyed by the rest of the name.
///
/// Names or values that are not valid Unicode are skipped.
fn select_prefixed<I>(prefix: &str, vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut selected = HashMap::new();
    for (key, value) in vars {
        let Some(field) = key.to_str().and_then(|k| k.strip_prefix(prefix)) else {
            continue;
        };
        let Some(value) = value.to_str() else {
            tracing::debug!("Skipping non-Unicode variable {}{}", prefix, field);
            continue;
        };
        if value.len() > MAX_ENV_VALUE_LEN {
            tracing::debug!("Skipping oversized variable {}{} ({} bytes)", prefix, field, value.len());
            continue;
        }
        selected.insert(field.to_string(), value.to_string());
    }
    selected
}

impl Default for EnvOverrides {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }
}
