// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the resolution engine.
//!
//! [`LookupEngine`] performs scope-aware lookups and `${...}` expansion over a
//! single checked-out store. [`ConfigManager`] is the request-facing facade on
//! top of it, and [`SettingsLoader`] assembles the settings both run with.

pub mod lookup;
pub mod manager;
pub mod settings_loader;
pub mod substitution;

// Re-export commonly used types
pub use lookup::LookupEngine;
pub use manager::{ConfigManager, LoadReport};
pub use settings_loader::SettingsLoader;
pub use substitution::Reference;
