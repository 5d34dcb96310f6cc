//! SiteVault: a local, single-user vault mapping site domains to secrets.
//!
//! Domains are stored only as keyed hashes, every entry is encrypted and
//! padded to a fixed size, and each entry carries a MAC binding it to its
//! domain so entries cannot be swapped between sites. A freshness tag over
//! the whole serialized vault lets the caller detect rollback.

pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod passwords;
pub mod vault;

pub use crypto::{CryptoProvider, SystemCrypto};
pub use errors::{Result, SiteVaultError};
pub use vault::{DecryptedEntry, FreshnessTag, Vault, VaultSnapshot};
