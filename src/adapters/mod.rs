// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing store and settings implementations.
//!
//! The stores implement the `KeyStore` and `StoreProvider` ports. The settings
//! adapters read [`Settings`](crate::domain::Settings) from a YAML file and
//! from environment variables.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "env")]
pub mod env_overrides;
#[cfg(feature = "yaml")]
pub mod settings_file;

// Re-export adapters based on feature flags
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis::{PooledConnection, RedisPool};

#[cfg(feature = "env")]
pub use env_overrides::{EnvOverrides, DEFAULT_ENV_PREFIX};
#[cfg(feature = "yaml")]
pub use settings_file::SettingsFile;
