// SPDX-License-Identifier: MIT OR Apache-2.0

//! A scope-aware configuration lookup crate.
//!
//! This crate resolves configuration values from a flat key-value store. A
//! request carries a *scope* (for example `site=east`, `host=web1`); the scope
//! selects which layers of an ordered search path apply, and values from the
//! applicable layers are merged by precedence into one answer that records
//! where every value came from.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types and pure logic (`Scope`, path templates,
//!   `ValueSource`, `LookupResult`, `Settings`, errors)
//! - **Ports**: Trait definitions for the store (`KeyStore`, `StoreProvider`)
//! - **Adapters**: Store implementations (in-memory, Redis) and settings
//!   sources (YAML file, environment)
//! - **Service**: The lookup engine, `${...}` substitution and the
//!   request-facing `ConfigManager`
//!
//! # Lookups
//!
//! - **Scalar**: the highest-precedence string wins
//! - **Hash**: fields are merged, higher precedence overriding lower
//! - **Hash field**: the highest-precedence hash holding the field wins
//! - **List**: lists from every layer are concatenated
//! - **List index**: one entry of the concatenated list
//!
//! Scalar, hash-field and list-index values may reference other configuration
//! as `${name}`, `${name/field}` or `${name/index/N}`; references are expanded
//! recursively with the same scope.
//!
//! # Feature Flags
//!
//! - `yaml`: Read settings from a YAML file (default)
//! - `env`: Override settings from `CONFMGR_*` environment variables (default)
//! - `cli`: Build the `confmgr` command-line tool (default)
//! - `redis`: Enable the Redis store (default)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use confmgr::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let settings = Settings {
//!     key_paths: vec!["site/%{site}".to_string(), "default".to_string()],
//!     ..Settings::default()
//! };
//! let store = MemoryStore::new()
//!     .with_hash("cfg:default:db", [("host", "db0"), ("port", "5432")])
//!     .with_hash("cfg:site/east:db", [("host", "east1")]);
//! let manager = ConfigManager::new(settings, store)?;
//!
//! let scope = manager.scope_from_headers([("X-Cfg-Site", "east")]);
//! let db = manager.lookup_hash("db", &scope)?;
//! println!("{}", db.to_json()?);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ConfmgrError, KeyKind, LookupResult, Result, Scope, Settings, StoredValue, ValueSource,
    };
    pub use crate::ports::{KeyStore, StoreProvider};
    pub use crate::service::{ConfigManager, LookupEngine, SettingsLoader};

    // Re-export adapters based on feature flags
    pub use crate::adapters::MemoryStore;
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvOverrides;
    #[cfg(feature = "redis")]
    pub use crate::adapters::RedisPool;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::SettingsFile;
}
