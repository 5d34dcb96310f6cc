//! The cryptographic capability the vault engine runs on.
//!
//! `CryptoProvider` bundles the three primitives the engine needs:
//! a secure random source, AES-256-GCM, and HMAC-SHA256. The engine
//! never calls a primitive directly, so tests can swap in a provider
//! with a deterministic random source.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::keys::{AeadKey, HashKey};
use crate::errors::{Result, SiteVaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag appended to every ciphertext.
pub const AEAD_TAG_LEN: usize = 16;

/// Size of an HMAC-SHA256 output in bytes.
pub const MAC_LEN: usize = 32;

/// Random bytes, authenticated encryption and keyed hashing.
pub trait CryptoProvider {
    /// Fill `dest` with cryptographically secure random bytes.
    fn fill_random(&self, dest: &mut [u8]) -> Result<()>;

    /// Encrypt and authenticate `plaintext`. The GCM tag is appended.
    fn seal(&self, key: &dyn AeadKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8])
        -> Result<Vec<u8>>;

    /// Decrypt `ciphertext`, failing with `DecryptionFailed` if the tag
    /// does not verify.
    fn open(
        &self,
        key: &dyn AeadKey,
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>>;

    /// HMAC-SHA256 over the concatenation of `parts`.
    fn keyed_hash(&self, key: &dyn HashKey, parts: &[&[u8]]) -> Result<[u8; MAC_LEN]>;

    /// Recompute the keyed hash and compare it with `expected` in
    /// constant time.
    fn verify_keyed_hash(
        &self,
        key: &dyn HashKey,
        parts: &[&[u8]],
        expected: &[u8],
    ) -> Result<bool> {
        let actual = self.keyed_hash(key, parts)?;
        Ok(actual[..].ct_eq(expected).into())
    }
}

/// The default provider: OS-seeded CSPRNG, `aes-gcm` and `hmac`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCrypto;

impl CryptoProvider for SystemCrypto {
    fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
        rand::rng().fill_bytes(dest);
        Ok(())
    }

    fn seal(
        &self,
        key: &dyn AeadKey,
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key.aead_key_bytes())
            .map_err(|e| SiteVaultError::Capability(format!("invalid AES key: {e}")))?;

        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|e| SiteVaultError::Capability(format!("encryption error: {e}")))
    }

    fn open(
        &self,
        key: &dyn AeadKey,
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let cipher = Aes256Gcm::new_from_slice(key.aead_key_bytes())
            .map_err(|e| SiteVaultError::Capability(format!("invalid AES key: {e}")))?;

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| SiteVaultError::DecryptionFailed)
    }

    fn keyed_hash(&self, key: &dyn HashKey, parts: &[&[u8]]) -> Result<[u8; MAC_LEN]> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key.hash_key_bytes())
            .map_err(|e| SiteVaultError::Capability(format!("invalid HMAC key: {e}")))?;

        for part in parts {
            mac.update(part);
        }

        let mut out = [0u8; MAC_LEN];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{EncKey, MacKey};

    #[test]
    fn seal_open_roundtrip() {
        let key = EncKey::from_bytes([0xAB; 32]);
        let nonce = [3u8; NONCE_LEN];
        let ct = SystemCrypto.seal(&key, &nonce, b"hello").unwrap();
        assert_eq!(ct.len(), 5 + AEAD_TAG_LEN);

        let pt = SystemCrypto.open(&key, &nonce, &ct).unwrap();
        assert_eq!(pt.as_slice(), b"hello");
    }

    #[test]
    fn open_with_wrong_key_is_decryption_failure() {
        let nonce = [3u8; NONCE_LEN];
        let ct = SystemCrypto
            .seal(&EncKey::from_bytes([1; 32]), &nonce, b"hello")
            .unwrap();
        let err = SystemCrypto
            .open(&EncKey::from_bytes([2; 32]), &nonce, &ct)
            .unwrap_err();
        assert!(matches!(err, SiteVaultError::DecryptionFailed));
    }

    #[test]
    fn keyed_hash_over_parts_matches_concatenation() {
        let key = MacKey::from_bytes([9; 32]);
        let split = SystemCrypto.keyed_hash(&key, &[b"ab".as_slice(), b"cd".as_slice()]).unwrap();
        let joined = SystemCrypto.keyed_hash(&key, &[b"abcd".as_slice()]).unwrap();
        assert_eq!(split, joined);
    }

    #[test]
    fn verify_rejects_truncated_tag() {
        let key = MacKey::from_bytes([9; 32]);
        let tag = SystemCrypto.keyed_hash(&key, &[b"data".as_slice()]).unwrap();
        assert!(SystemCrypto
            .verify_keyed_hash(&key, &[b"data".as_slice()], &tag)
            .unwrap());
        assert!(!SystemCrypto
            .verify_keyed_hash(&key, &[b"data".as_slice()], &tag[..16])
            .unwrap());
    }
}
