//! Cryptographic primitives for SiteVault.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 passphrase stretching (`kdf`)
//! - The role-restricted key hierarchy derived from it (`keys`)
//! - The injectable random/AEAD/HMAC capability (`provider`)

pub mod kdf;
pub mod keys;
pub mod provider;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{derive_key_material, CryptoProvider, ...};
pub use kdf::{derive_master_key, derive_master_key_with_params, generate_salt, KdfParams};
pub use keys::{derive_key_material, EncKey, KeyMaterial, MacKey, MasterKey};
pub use provider::{CryptoProvider, SystemCrypto};
