// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static settings read once at startup.

use crate::domain::errors::{ConfmgrError, Result};
use serde::{Deserialize, Serialize};

/// Default search path: a single, unparameterized layer.
pub const DEFAULT_KEY_PATH: &str = "default";

/// Default prefix prepended to every absolute key name.
pub const DEFAULT_KEY_PREFIX: &str = "cfg:";

/// Default marker for scope-carrying request headers.
pub const DEFAULT_HDR_PREFIX: &str = "x-cfg-";

/// Default limit on nested `${...}` expansion.
pub const DEFAULT_MAX_SUBSTITUTION_DEPTH: usize = 16;

/// Settings for the lookup engine and its store.
///
/// All fields have defaults, so a settings file only needs to name what it
/// changes.
///
/// # Examples
///
/// ```
/// use confmgr::domain::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.key_prefix, "cfg:");
/// assert_eq!(settings.absolute_key("site/east", "db"), "cfg:site/east:db");
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Search-path templates, highest precedence first
    pub key_paths: Vec<String>,
    /// Prefix of every absolute key name
    pub key_prefix: String,
    /// Marker identifying scope headers
    pub hdr_prefix: String,
    /// Maximum nesting of `${...}` expansion before failing
    pub max_substitution_depth: usize,
    /// Redis connection settings
    pub redis: RedisSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_paths: vec![DEFAULT_KEY_PATH.to_string()],
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            hdr_prefix: DEFAULT_HDR_PREFIX.to_string(),
            max_substitution_depth: DEFAULT_MAX_SUBSTITUTION_DEPTH,
            redis: RedisSettings::default(),
        }
    }
}

impl Settings {
    /// Builds the absolute key name for a resolved path and base key.
    pub fn absolute_key(&self, path: &str, key: &str) -> String {
        format!("{}{}:{}", self.key_prefix, path, key)
    }

    /// Prepends the key prefix unless the name already carries it.
    pub fn prefixed(&self, name: &str) -> String {
        if name.starts_with(&self.key_prefix) {
            name.to_string()
        } else {
            format!("{}{}", self.key_prefix, name)
        }
    }

    /// Checks the settings for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_substitution_depth == 0 {
            return Err(ConfmgrError::InvalidSettings {
                message: "max_substitution_depth must be at least 1".to_string(),
            });
        }
        if self.redis.max_active == 0 {
            return Err(ConfmgrError::InvalidSettings {
                message: "redis.max_active must be at least 1".to_string(),
            });
        }
        if self.redis.max_idle > self.redis.max_active {
            return Err(ConfmgrError::InvalidSettings {
                message: format!(
                    "redis.max_idle ({}) exceeds redis.max_active ({})",
                    self.redis.max_idle, self.redis.max_active
                ),
            });
        }
        Ok(())
    }
}

/// Connection pool settings for the Redis store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    /// Connection URL
    pub url: String,
    /// Connections kept open for reuse
    pub max_idle: usize,
    /// Upper bound on open connections
    pub max_active: usize,
    /// Block when the pool is exhausted instead of failing
    pub wait: bool,
    /// Upper bound on a blocking wait, in milliseconds
    pub wait_timeout_ms: Option<u64>,
    /// Idle connections older than this are closed
    pub idle_timeout_secs: u64,
    /// Timeout for establishing a new connection, in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_idle: 5,
            max_active: 20,
            wait: true,
            wait_timeout_ms: None,
            idle_timeout_secs: 240,
            connect_timeout_ms: 5000,
        }
    }
}
