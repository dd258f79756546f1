// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for settings precedence: defaults < YAML file < environment.

#![cfg(all(feature = "yaml", feature = "env"))]

use confmgr::adapters::{EnvOverrides, SettingsFile};
use confmgr::domain::{ConfmgrError, Settings};
use confmgr::service::SettingsLoader;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn write_settings(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("confmgr.yaml");
    fs::write(&path, content).unwrap();
    path
}

fn env(pairs: &[(&str, &str)]) -> EnvOverrides {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvOverrides::with_values(values)
}

#[test]
fn test_file_overrides_defaults_field_by_field() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        r#"
key_paths:
  - "host/%{host}"
  - "site/%{site}"
  - default
redis:
  url: "redis://config-store:6379"
  max_idle: 2
"#,
    );

    let settings = SettingsLoader::new().with_file(&path).load().unwrap();
    assert_eq!(settings.key_paths, vec!["host/%{host}", "site/%{site}", "default"]);
    assert_eq!(settings.redis.url, "redis://config-store:6379");
    assert_eq!(settings.redis.max_idle, 2);

    let defaults = Settings::default();
    assert_eq!(settings.key_prefix, defaults.key_prefix);
    assert_eq!(settings.hdr_prefix, defaults.hdr_prefix);
    assert_eq!(settings.redis.max_active, defaults.redis.max_active);
    assert_eq!(settings.redis.idle_timeout_secs, 240);
}

#[test]
fn test_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "key_prefix: \"file:\"\nkey_paths: [a, b]\n");

    let settings = SettingsLoader::new()
        .with_file(&path)
        .with_env_overrides(env(&[("KEY_PATHS", "c,d"), ("REDIS_MAX_ACTIVE", "7")]))
        .load()
        .unwrap();

    assert_eq!(settings.key_prefix, "file:");
    assert_eq!(settings.key_paths, vec!["c", "d"]);
    assert_eq!(settings.redis.max_active, 7);
}

#[test]
fn test_loaded_settings_are_validated() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "redis:\n  max_idle: 10\n  max_active: 4\n");

    let err = SettingsLoader::new().with_file(&path).load().unwrap_err();
    assert!(matches!(err, ConfmgrError::InvalidSettings { .. }));
}

#[test]
fn test_env_can_repair_file_settings() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "max_substitution_depth: 0\n");

    let settings = SettingsLoader::new()
        .with_file(&path)
        .with_env_overrides(env(&[("MAX_SUBSTITUTION_DEPTH", "8")]))
        .load()
        .unwrap();
    assert_eq!(settings.max_substitution_depth, 8);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = SettingsLoader::new()
        .with_file(dir.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

#[test]
fn test_oversized_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut content = String::from("key_paths:\n");
    while content.len() <= 1024 * 1024 {
        content.push_str("  - some/long/path/template/that/pads/the/file\n");
    }
    let path = write_settings(&dir, &content);

    let err = SettingsFile::load(&path).unwrap_err();
    assert!(err.to_string().contains("too large"));
}

#[test]
fn test_unknown_fields_are_ignored() {
    let settings = SettingsFile::parse("listen:\n  port: 8080\nkey_prefix: x\n").unwrap();
    assert_eq!(settings.key_prefix, "x");
}
