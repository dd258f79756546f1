// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML settings file adapter.
//!
//! This module reads [`Settings`] from a YAML file, either at an explicit path
//! or from the first file found in the standard locations.

use crate::domain::{ConfmgrError, Result, Settings};
use directories::ProjectDirs;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum allowed size for a settings file (1MB)
const MAX_SETTINGS_FILE_SIZE: u64 = 1024 * 1024;

/// System-wide settings file, tried first during discovery.
pub const SYSTEM_SETTINGS_FILE: &str = "/etc/confmgr.yaml";

/// Settings file in the working directory, tried second.
pub const LOCAL_SETTINGS_FILE: &str = "confmgr.yaml";

/// Settings loaded from a YAML file.
///
/// Every field is optional in the file; anything left out keeps its default.
///
/// # Examples
///
/// ```rust
/// use confmgr::adapters::SettingsFile;
///
/// let yaml = "key_paths:\n  - \"site/%{site}\"\n  - default\nredis:\n  max_active: 8\n";
/// let settings = SettingsFile::parse(yaml).unwrap();
/// assert_eq!(settings.key_paths, vec!["site/%{site}", "default"]);
/// assert_eq!(settings.redis.max_active, 8);
/// assert_eq!(settings.key_prefix, "cfg:");
/// ```
#[derive(Debug, Clone)]
pub struct SettingsFile {
    /// Canonical path the settings were read from
    path: PathBuf,
    /// Parsed settings
    settings: Settings,
    /// The document as written, used to layer only the keys it sets
    document: Value,
}

impl SettingsFile {
    /// Reads settings from a specific file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let canonical = path.canonicalize().map_err(|e| ConfmgrError::ParseError {
            message: format!("Invalid or inaccessible settings file: {}", path.display()),
            source: Some(Box::new(e)),
        })?;

        let metadata = fs::metadata(&canonical)?;
        if metadata.len() > MAX_SETTINGS_FILE_SIZE {
            return Err(ConfmgrError::ParseError {
                message: format!(
                    "Settings file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_SETTINGS_FILE_SIZE
                ),
                source: None,
            });
        }

        let content = fs::read_to_string(&canonical)?;
        let document = Self::parse_document(&content)?;
        let settings = Self::to_settings(document.clone())?;
        tracing::info!("Read settings from {}", canonical.display());

        Ok(Self {
            path: canonical,
            settings,
            document,
        })
    }

    /// Parses settings from YAML text.
    ///
    /// An empty document yields the defaults.
    pub fn parse(content: &str) -> Result<Settings> {
        Self::to_settings(Self::parse_document(content)?)
    }

    /// Layers the keys this file sets over `base`.
    ///
    /// Nested mappings such as `redis` are merged key by key; any other value
    /// in the file replaces the one in `base`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use confmgr::adapters::SettingsFile;
    /// use confmgr::domain::Settings;
    ///
    /// # fn main() -> confmgr::domain::Result<()> {
    /// let base = Settings { key_prefix: "app:".to_string(), ..Settings::default() };
    /// let file = SettingsFile::load("/etc/confmgr.yaml")?;
    /// let settings = file.apply_to(&base)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn apply_to(&self, base: &Settings) -> Result<Settings> {
        let mut merged = serde_yaml::to_value(base).map_err(|e| ConfmgrError::ParseError {
            message: format!("Failed to encode base settings: {}", e),
            source: Some(Box::new(e)),
        })?;
        merge_value(&mut merged, self.document.clone());
        Self::to_settings(merged)
    }

    fn parse_document(content: &str) -> Result<Value> {
        if content.trim().is_empty() {
            return Ok(Value::Mapping(Default::default()));
        }
        serde_yaml::from_str(content).map_err(|e| ConfmgrError::ParseError {
            message: format!("Failed to parse settings YAML: {}", e),
            source: Some(Box::new(e)),
        })
    }

    fn to_settings(document: Value) -> Result<Settings> {
        serde_yaml::from_value(document).map_err(|e| ConfmgrError::ParseError {
            message: format!("Failed to parse settings YAML: {}", e),
            source: Some(Box::new(e)),
        })
    }

    /// Loads the first settings file found in the standard locations.
    ///
    /// The locations are tried in the order given by
    /// [`default_locations`](Self::default_locations). Returns `Ok(None)` if no
    /// file exists.
    pub fn discover() -> Result<Option<Self>> {
        Self::discover_in(Self::default_locations())
    }

    /// Loads the first existing file among `candidates`.
    ///
    /// A candidate that exists but cannot be read or parsed is an error; it is
    /// not skipped in favour of the next one.
    pub fn discover_in<I, P>(candidates: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for candidate in candidates {
            let candidate = candidate.as_ref();
            if candidate.is_file() {
                return Self::load(candidate).map(Some);
            }
            tracing::debug!("No settings file at {}", candidate.display());
        }
        Ok(None)
    }

    /// Returns the discovery locations, in the order they are tried.
    ///
    /// These are [`SYSTEM_SETTINGS_FILE`], [`LOCAL_SETTINGS_FILE`] in the
    /// working directory, and `config.yaml` in the OS-appropriate
    /// configuration directory when one can be determined.
    pub fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![
            PathBuf::from(SYSTEM_SETTINGS_FILE),
            PathBuf::from(LOCAL_SETTINGS_FILE),
        ];
        if let Some(dirs) = ProjectDirs::from("", "", "confmgr") {
            locations.push(dirs.config_dir().join("config.yaml"));
        }
        locations
    }

    /// Returns the path the settings were read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the parsed settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Consumes the adapter, returning the parsed settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
