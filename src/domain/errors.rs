// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration manager.
//!
//! This module defines every error that can occur while resolving, storing or
//! loading configuration. All errors use `thiserror` for proper error handling
//! and conversion.

use thiserror::Error;

/// The main error type for configuration lookups and store operations.
///
/// Errors fall into three groups:
///
/// - **Soft**: [`ConfmgrError::KeyNotFound`] means no candidate key held a value.
///   It is raised only at the lookup boundary and callers usually report it as
///   "missing" rather than as a failure.
/// - **Hard lookup errors**: a hash field or list index that does not exist, or
///   a substitution chain that never terminates.
/// - **Backend errors**: anything that went wrong talking to the store. These
///   are always propagated unchanged.
///
/// # Examples
///
/// ```
/// use confmgr::domain::errors::ConfmgrError;
///
/// fn lookup() -> Result<String, ConfmgrError> {
///     Err(ConfmgrError::KeyNotFound {
///         key: "db".to_string(),
///     })
/// }
///
/// assert!(lookup().unwrap_err().is_not_found());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfmgrError {
    /// No candidate key on the search path held a value of the wanted kind.
    #[error("Key {key} not found")]
    KeyNotFound {
        /// The base key name that was looked up
        key: String,
    },

    /// No hash on the search path contains the requested field.
    #[error("Hash field '{field}' not found in key {key}")]
    HashFieldNotFound {
        /// The base key name that was looked up
        key: String,
        /// The missing field
        field: String,
    },

    /// The requested index lies past the end of the concatenated list.
    #[error("List index {index} out of range for key {key} (length {length})")]
    ListIndexOutOfRange {
        /// The base key name that was looked up
        key: String,
        /// The requested index
        index: i64,
        /// The length of the concatenated list
        length: usize,
    },

    /// List indices must not be negative.
    #[error("Invalid negative list index {index} for key {key}")]
    NegativeListIndex {
        /// The base key name that was looked up
        key: String,
        /// The requested index
        index: i64,
    },

    /// A chain of `${...}` references did not terminate within the depth limit.
    #[error("Substitution cycle detected while expanding '{reference}' (depth {depth})")]
    SubstitutionCycle {
        /// The reference that was being expanded when the limit was hit
        reference: String,
        /// The depth limit that was reached
        depth: usize,
    },

    /// The store could not be reached.
    #[error("Backend '{backend}' unavailable: {message}")]
    BackendUnavailable {
        /// The name of the store
        backend: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The store reported an error other than a connectivity failure.
    #[error("Backend '{backend}' error: {message}")]
    Backend {
        /// The name of the store
        backend: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The store holds a value whose type has no [`KeyKind`](crate::domain::KeyKind).
    #[error("Unsupported type '{kind}' stored at key {key}")]
    UnsupportedKeyType {
        /// The absolute key name
        key: String,
        /// The type reported by the store
        kind: String,
    },

    /// No store connection became available within the pool's wait policy.
    #[error("Connection pool exhausted ({max_active} active connections)")]
    PoolExhausted {
        /// The pool's active connection limit
        max_active: usize,
    },

    /// The settings failed validation.
    #[error("Invalid settings: {message}")]
    InvalidSettings {
        /// The error message
        message: String,
    },

    /// Failed to parse a settings file or a stored-value payload.
    #[error("Failed to parse: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred while reading settings or defaults.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfmgrError {
    /// Returns `true` for the soft "nothing found" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfmgrError::KeyNotFound { .. })
    }

    /// Returns `true` when the store could not be reached at all.
    ///
    /// Candidate scanning skips probe failures unless this returns `true`.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ConfmgrError::BackendUnavailable { .. } | ConfmgrError::PoolExhausted { .. }
        )
    }

    /// Creates a [`ConfmgrError::Backend`] with an underlying error.
    pub fn backend<E>(backend: &str, message: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfmgrError::Backend {
            backend: backend.to_string(),
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }

    /// Creates a [`ConfmgrError::BackendUnavailable`] with an underlying error.
    pub fn unavailable<E>(backend: &str, message: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfmgrError::BackendUnavailable {
            backend: backend.to_string(),
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfmgrError>;
