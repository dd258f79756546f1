// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered settings assembly.
//!
//! Settings are built from defaults, then a YAML file, then environment
//! overrides. Each layer replaces only what it sets. Command-line flags are
//! applied by the caller on the returned value.

#[cfg(feature = "env")]
use crate::adapters::EnvOverrides;
use crate::domain::{Result, Settings};
use std::path::PathBuf;

/// Where the settings file comes from.
#[derive(Debug, Clone, Default)]
enum FileSource {
    #[default]
    None,
    Discover,
    Path(PathBuf),
}

/// Builder that assembles [`Settings`] from its sources.
///
/// # Examples
///
/// ```rust
/// use confmgr::service::SettingsLoader;
///
/// # fn main() -> confmgr::domain::Result<()> {
/// // Defaults only
/// let settings = SettingsLoader::new().load()?;
/// assert_eq!(settings.key_paths, vec!["default"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    base: Settings,
    file: FileSource,
    #[cfg(feature = "env")]
    env: Option<EnvOverrides>,
}

impl SettingsLoader {
    /// Creates a loader that starts from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from `base` instead of the defaults.
    pub fn with_base(mut self, base: Settings) -> Self {
        self.base = base;
        self
    }

    /// Reads the settings file at `path`. A missing file is an error.
    #[cfg(feature = "yaml")]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = FileSource::Path(path.into());
        self
    }

    /// Reads the first settings file found in the standard locations, if any.
    #[cfg(feature = "yaml")]
    pub fn with_discovery(mut self) -> Self {
        self.file = FileSource::Discover;
        self
    }

    /// Applies environment overrides with the default `CONFMGR_` prefix.
    #[cfg(feature = "env")]
    pub fn with_env(self) -> Self {
        self.with_env_overrides(EnvOverrides::default())
    }

    /// Applies the given environment overrides.
    #[cfg(feature = "env")]
    pub fn with_env_overrides(mut self, overrides: EnvOverrides) -> Self {
        self.env = Some(overrides);
        self
    }

    /// Builds the settings and validates them.
    pub fn load(self) -> Result<Settings> {
        let mut settings = match self.file {
            FileSource::None => self.base,
            #[cfg(feature = "yaml")]
            FileSource::Path(path) => crate::adapters::SettingsFile::load(path)?.apply_to(&self.base)?,
            #[cfg(feature = "yaml")]
            FileSource::Discover => match crate::adapters::SettingsFile::discover()? {
                Some(file) => file.apply_to(&self.base)?,
                None => {
                    tracing::debug!("No settings file found, using defaults");
                    self.base
                }
            },
            #[cfg(not(feature = "yaml"))]
            _ => self.base,
        };

        #[cfg(feature = "env")]
        {
            if let Some(overrides) = &self.env {
                overrides.apply(&mut settings)?;
            }
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only() {
        assert_eq!(SettingsLoader::new().load().unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        let base = Settings {
            max_substitution_depth: 0,
            ..Settings::default()
        };
        assert!(SettingsLoader::new().with_base(base).load().is_err());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_file_layers_over_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confmgr.yaml");
        std::fs::write(&path, "hdr_prefix: x-file-\n").unwrap();

        let base = Settings {
            key_prefix: "base:".to_string(),
            key_paths: vec!["site/%{site}".to_string(), "default".to_string()],
            ..Settings::default()
        };
        let settings = SettingsLoader::new()
            .with_base(base)
            .with_file(&path)
            .load()
            .unwrap();
        assert_eq!(settings.key_prefix, "base:");
        assert_eq!(settings.key_paths, vec!["site/%{site}", "default"]);
        assert_eq!(settings.hdr_prefix, "x-file-");
    }

    #[cfg(all(feature = "yaml", feature = "env"))]
    #[test]
    fn test_env_overrides_file() {
        use std::collections::HashMap;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confmgr.yaml");
        std::fs::write(&path, "key_prefix: file\nhdr_prefix: x-file-\n").unwrap();

        let mut env = HashMap::new();
        env.insert("KEY_PREFIX".to_string(), "env".to_string());

        let settings = SettingsLoader::new()
            .with_file(&path)
            .with_env_overrides(EnvOverrides::with_values(env))
            .load()
            .unwrap();
        assert_eq!(settings.key_prefix, "env");
        assert_eq!(settings.hdr_prefix, "x-file-");
    }
}
