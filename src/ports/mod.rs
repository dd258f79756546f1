// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the traits (ports) that the resolution engine talks to.
//! The stores in the adapters layer implement them.

pub mod store;

// Re-export commonly used types
pub use store::{KeyStore, StoreProvider};
