//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is configurable via `KdfParams` (loaded from
//! `.sitevault.toml` or defaults) but can never drop below
//! `MIN_ITERATIONS`.

use rand::RngCore;
use sha2::Sha256;

use crate::errors::{Result, SiteVaultError};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived master key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Longest passphrase we accept, in bytes.
pub const MAX_PASSPHRASE_LEN: usize = 1024;

/// Lowest iteration count we are willing to derive with.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Configurable PBKDF2 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of PBKDF2 iterations (default: 100 000).
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: MIN_ITERATIONS,
        }
    }
}

/// Check a passphrase against the accepted length bounds.
pub fn validate_passphrase(passphrase: &[u8]) -> Result<()> {
    if passphrase.is_empty() {
        return Err(SiteVaultError::InvalidInput(
            "passphrase cannot be empty".into(),
        ));
    }
    if passphrase.len() > MAX_PASSPHRASE_LEN {
        return Err(SiteVaultError::InvalidInput(format!(
            "passphrase cannot exceed {MAX_PASSPHRASE_LEN} bytes (got {})",
            passphrase.len()
        )));
    }
    Ok(())
}

/// Derive a 32-byte master key from a passphrase and salt with the
/// default parameters.
pub fn derive_master_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Result<[u8; KEY_LEN]> {
    derive_master_key_with_params(passphrase, salt, &KdfParams::default())
}

/// Derive a 32-byte master key with explicit PBKDF2 parameters.
///
/// The same passphrase + salt + params always produce the same key.
pub fn derive_master_key_with_params(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<[u8; KEY_LEN]> {
    validate_passphrase(passphrase)?;

    if params.iterations < MIN_ITERATIONS {
        return Err(SiteVaultError::Capability(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {})",
            params.iterations
        )));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, params.iterations, &mut key);
    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
