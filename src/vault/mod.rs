//! Vault module: the encrypted domain → secret engine.
//!
//! This module provides:
//! - Lookup-token hashing that hides domain names (`domain`)
//! - Fixed-block length-hiding padding (`padding`)
//! - Per-entry encryption, MAC and domain binding (`entry`)
//! - The serialized form and its freshness tag (`format`)
//! - The high-level `Vault` handle (`store`)

pub mod domain;
pub mod entry;
pub mod format;
pub mod padding;
pub mod store;

// Re-export the most commonly used items.
pub use domain::LookupToken;
pub use entry::{DecryptedEntry, VaultEntry};
pub use format::{FreshnessTag, VaultSnapshot};
pub use store::Vault;
