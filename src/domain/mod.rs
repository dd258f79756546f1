// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types and pure resolution logic.
//!
//! This module holds the types every other layer speaks in: scopes, key kinds,
//! provenance-tagged values, settings and errors. It also holds the path
//! template resolver, which needs nothing but a scope.

pub mod errors;
pub mod key_kind;
pub mod path_template;
pub mod scope;
pub mod settings;
pub mod value;

// Re-export commonly used types
pub use errors::{ConfmgrError, Result};
pub use key_kind::KeyKind;
pub use path_template::{resolve_paths, resolve_template};
pub use scope::Scope;
pub use settings::{RedisSettings, Settings};
pub use value::{LookupResult, StoredValue, ValueSource};
