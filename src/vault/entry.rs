//! Encoding and decoding of a single vault entry.
//!
//! An entry is the padded payload `{domain, secret}` sealed with
//! AES-256-GCM under a fresh random nonce, plus an HMAC-SHA256 over
//! `nonce || ciphertext`.
//!
//! The payload is laid out as
//!
//! ```text
//! [domain len: u8][domain bytes][secret len: u8][secret bytes]
//! ```
//!
//! so its size is exactly `2 + domain + secret` whatever characters the
//! two strings contain, and every domain and secret within their limits
//! fits one padded block.
//!
//! Decoding runs in a fixed order:
//! 1. AES-GCM open. A rejected tag is `DecryptionFailed`.
//! 2. Unpad and parse, then check the payload's domain against the one
//!    the caller asked for. A mismatch means the entry was moved to
//!    another slot and is reported as `SwapAttack`.
//! 3. Verify the entry MAC in constant time (`IntegrityFailed`).
//!
//! The domain check depends only on the ciphertext, so it runs on every
//! lookup whether or not the vault was loaded with a freshness tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::domain::{hash_domain, validate_domain, LookupToken, MAX_DOMAIN_LEN};
use super::format::{base64_decode, base64_decode_array, base64_encode, hex_decode_array, hex_encode};
use super::padding::{pad, unpad, MAX_PAYLOAD_LEN};
use crate::crypto::provider::{CryptoProvider, MAC_LEN, NONCE_LEN};
use crate::crypto::KeyMaterial;
use crate::errors::{Result, SiteVaultError};

/// Largest secret we accept, in bytes.
pub const MAX_SECRET_LEN: usize = 64;

const _: () = assert!(2 + MAX_DOMAIN_LEN + MAX_SECRET_LEN <= MAX_PAYLOAD_LEN);

/// One encrypted entry as it appears in the serialized vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VaultEntry {
    /// AES-GCM nonce, unique per entry.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode_array")]
    pub iv: [u8; NONCE_LEN],

    /// Padded payload ciphertext with the GCM tag appended.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,

    /// HMAC-SHA256(macKey, iv || ciphertext).
    #[serde(serialize_with = "hex_encode", deserialize_with = "hex_decode_array")]
    pub mac: [u8; MAC_LEN],

    /// When this domain was first stored.
    pub created_at: DateTime<Utc>,
}

/// A decrypted entry returned by `Vault::entries`.
#[derive(Debug, Clone)]
pub struct DecryptedEntry {
    pub domain: String,
    pub secret: Zeroizing<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct Payload {
    domain: String,
    secret: String,
}

impl Payload {
    fn encode_fields(domain: &str, secret: &str) -> Result<Zeroizing<Vec<u8>>> {
        let mut out = Zeroizing::new(Vec::with_capacity(2 + domain.len() + secret.len()));
        for field in [domain, secret] {
            let len = u8::try_from(field.len()).map_err(|_| {
                SiteVaultError::InvalidInput(format!("payload field of {} bytes", field.len()))
            })?;
            out.push(len);
            out.extend_from_slice(field.as_bytes());
        }
        Ok(out)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (domain, rest) = split_field(bytes)?;
        let (secret, rest) = split_field(rest)?;
        if !rest.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            domain: domain.to_owned(),
            secret: secret.to_owned(),
        })
    }
}

/// Take one length-prefixed UTF-8 field off the front of `bytes`.
fn split_field(bytes: &[u8]) -> Result<(&str, &[u8])> {
    let (&len, rest) = bytes.split_first().ok_or_else(malformed)?;
    let len = usize::from(len);
    if rest.len() < len {
        return Err(malformed());
    }
    let (field, rest) = rest.split_at(len);
    let field = std::str::from_utf8(field).map_err(|_| malformed())?;
    Ok((field, rest))
}

fn malformed() -> SiteVaultError {
    SiteVaultError::IntegrityFailed("entry payload is malformed".into())
}

/// Check a secret against the fixed capacity.
pub fn validate_secret(secret: &str) -> Result<()> {
    if secret.len() > MAX_SECRET_LEN {
        return Err(SiteVaultError::InvalidInput(format!(
            "secret cannot exceed {MAX_SECRET_LEN} bytes (got {})",
            secret.len()
        )));
    }
    Ok(())
}

/// Encrypt `secret` for `domain` into a new entry.
pub fn encode<P: CryptoProvider + ?Sized>(
    provider: &P,
    keys: &KeyMaterial,
    domain: &str,
    secret: &str,
    created_at: DateTime<Utc>,
) -> Result<VaultEntry> {
    validate_domain(domain)?;
    validate_secret(secret)?;

    let payload = Payload::encode_fields(domain, secret)?;
    let block = pad(&payload)?;

    let mut iv = [0u8; NONCE_LEN];
    provider.fill_random(&mut iv)?;

    let ciphertext = provider.seal(keys.enc_key(), &iv, &block)?;
    let mac = provider.keyed_hash(keys.mac_key(), &[iv.as_slice(), ciphertext.as_slice()])?;

    Ok(VaultEntry {
        iv,
        ciphertext,
        mac,
        created_at,
    })
}

/// Decrypt `entry` and return its secret, provided it belongs to
/// `domain` and its MAC verifies.
pub fn decode<P: CryptoProvider + ?Sized>(
    provider: &P,
    keys: &KeyMaterial,
    entry: &VaultEntry,
    domain: &str,
) -> Result<Zeroizing<String>> {
    let mut payload = open_payload(provider, keys, entry)?;

    if !bool::from(payload.domain.as_bytes().ct_eq(domain.as_bytes())) {
        warn!("entry payload names a different domain than the one requested");
        return Err(SiteVaultError::SwapAttack);
    }

    verify_entry_mac(provider, keys, entry)?;
    Ok(Zeroizing::new(std::mem::take(&mut payload.secret)))
}

/// Decrypt the entry stored under `token` without knowing its domain.
///
/// The domain found inside the payload must hash back to `token`;
/// otherwise the entry has been relocated.
pub fn decode_at<P: CryptoProvider + ?Sized>(
    provider: &P,
    keys: &KeyMaterial,
    token: &LookupToken,
    entry: &VaultEntry,
) -> Result<DecryptedEntry> {
    let mut payload = open_payload(provider, keys, entry)?;

    let expected = hash_domain(provider, keys.mac_key(), &payload.domain)?;
    if !bool::from(expected.as_str().as_bytes().ct_eq(token.as_str().as_bytes())) {
        warn!(token = token.short(), "entry payload does not hash to its lookup token");
        return Err(SiteVaultError::SwapAttack);
    }

    verify_entry_mac(provider, keys, entry)?;
    Ok(DecryptedEntry {
        domain: std::mem::take(&mut payload.domain),
        secret: Zeroizing::new(std::mem::take(&mut payload.secret)),
        created_at: entry.created_at,
    })
}

fn open_payload<P: CryptoProvider + ?Sized>(
    provider: &P,
    keys: &KeyMaterial,
    entry: &VaultEntry,
) -> Result<Payload> {
    let block = provider.open(keys.enc_key(), &entry.iv, &entry.ciphertext)?;
    let payload_bytes = unpad(&block)?;
    Payload::from_bytes(&payload_bytes)
}

fn verify_entry_mac<P: CryptoProvider + ?Sized>(
    provider: &P,
    keys: &KeyMaterial,
    entry: &VaultEntry,
) -> Result<()> {
    let parts = [entry.iv.as_slice(), entry.ciphertext.as_slice()];
    if provider.verify_keyed_hash(keys.mac_key(), &parts, &entry.mac)? {
        Ok(())
    } else {
        warn!("entry MAC mismatch");
        Err(SiteVaultError::IntegrityFailed("entry MAC mismatch".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{MasterKey, SystemCrypto};
    use crate::vault::format::CIPHERTEXT_LEN;
    use proptest::prelude::*;

    fn keys() -> KeyMaterial {
        KeyMaterial::from_master(MasterKey::from_bytes([0x11; 32])).unwrap()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let keys = keys();
        let entry = encode(&SystemCrypto, &keys, "bank.com", "p1", Utc::now()).unwrap();
        let secret = decode(&SystemCrypto, &keys, &entry, "bank.com").unwrap();
        assert_eq!(secret.as_str(), "p1");
    }

    #[test]
    fn nonces_differ_between_entries() {
        let keys = keys();
        let a = encode(&SystemCrypto, &keys, "bank.com", "p1", Utc::now()).unwrap();
        let b = encode(&SystemCrypto, &keys, "bank.com", "p1", Utc::now()).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_domain_is_swap_attack() {
        let keys = keys();
        let entry = encode(&SystemCrypto, &keys, "evil.com", "p2", Utc::now()).unwrap();
        let err = decode(&SystemCrypto, &keys, &entry, "bank.com").unwrap_err();
        assert!(matches!(err, SiteVaultError::SwapAttack));
    }

    #[test]
    fn swap_is_reported_before_mac_check() {
        let keys = keys();
        let mut entry = encode(&SystemCrypto, &keys, "evil.com", "p2", Utc::now()).unwrap();
        entry.mac[0] ^= 0x01;
        let err = decode(&SystemCrypto, &keys, &entry, "bank.com").unwrap_err();
        assert!(matches!(err, SiteVaultError::SwapAttack));
    }

    #[test]
    fn flipped_mac_is_integrity_failure() {
        let keys = keys();
        let mut entry = encode(&SystemCrypto, &keys, "bank.com", "p1", Utc::now()).unwrap();
        entry.mac[31] ^= 0x80;
        let err = decode(&SystemCrypto, &keys, &entry, "bank.com").unwrap_err();
        assert!(matches!(err, SiteVaultError::IntegrityFailed(_)));
    }

    #[test]
    fn flipped_ciphertext_is_decryption_failure() {
        let keys = keys();
        let mut entry = encode(&SystemCrypto, &keys, "bank.com", "p1", Utc::now()).unwrap();
        entry.ciphertext[10] ^= 0x01;
        let err = decode(&SystemCrypto, &keys, &entry, "bank.com").unwrap_err();
        assert!(matches!(err, SiteVaultError::DecryptionFailed));
    }

    #[test]
    fn oversized_secret_is_rejected() {
        let keys = keys();
        let secret = "s".repeat(MAX_SECRET_LEN + 1);
        let err = encode(&SystemCrypto, &keys, "bank.com", &secret, Utc::now()).unwrap_err();
        assert!(matches!(err, SiteVaultError::InvalidInput(_)));
    }

    #[test]
    fn quotes_backslashes_and_controls_fit_at_full_size() {
        let keys = keys();
        let domain = "d".repeat(MAX_DOMAIN_LEN);
        for ch in ["\"", "\\", "\u{1}"] {
            let secret = ch.repeat(MAX_SECRET_LEN);
            let entry = encode(&SystemCrypto, &keys, &domain, &secret, Utc::now()).unwrap();
            assert_eq!(entry.ciphertext.len(), CIPHERTEXT_LEN);
            let back = decode(&SystemCrypto, &keys, &entry, &domain).unwrap();
            assert_eq!(back.as_str(), secret);
        }
    }

    #[test]
    fn payload_layout_is_length_prefixed() {
        let bytes = Payload::encode_fields("ab", "xyz").unwrap();
        assert_eq!(bytes.as_slice(), b"\x02ab\x03xyz");

        let parsed = Payload::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.domain, "ab");
        assert_eq!(parsed.secret, "xyz");
    }

    #[test]
    fn malformed_payloads_are_integrity_failures() {
        for bytes in [
            b"".as_slice(),
            b"\x05ab".as_slice(),
            b"\x02ab".as_slice(),
            b"\x02ab\x01xy".as_slice(),
            b"\x01\xff\x00".as_slice(),
        ] {
            assert!(matches!(
                Payload::from_bytes(bytes),
                Err(SiteVaultError::IntegrityFailed(_))
            ));
        }
    }

    #[test]
    fn decode_at_checks_token_binding() {
        let keys = keys();
        let entry = encode(&SystemCrypto, &keys, "evil.com", "p2", Utc::now()).unwrap();
        let bank = hash_domain(&SystemCrypto, keys.mac_key(), "bank.com").unwrap();
        let evil = hash_domain(&SystemCrypto, keys.mac_key(), "evil.com").unwrap();

        let ok = decode_at(&SystemCrypto, &keys, &evil, &entry).unwrap();
        assert_eq!(ok.domain, "evil.com");
        assert_eq!(ok.secret.as_str(), "p2");

        let err = decode_at(&SystemCrypto, &keys, &bank, &entry).unwrap_err();
        assert!(matches!(err, SiteVaultError::SwapAttack));
    }

    #[test]
    fn entry_json_uses_documented_field_names() {
        let keys = keys();
        let entry = encode(&SystemCrypto, &keys, "bank.com", "p1", Utc::now()).unwrap();
        let value = serde_json::to_value(&entry).unwrap();
        let obj = value.as_object().unwrap();
        let mut names: Vec<&str> = obj.keys().map(String::as_str).collect();
        names.sort_unstable();
        assert_eq!(names, ["ciphertext", "createdAt", "iv", "mac"]);
        assert_eq!(obj["mac"].as_str().unwrap().len(), MAC_LEN * 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn escaped_characters_roundtrip_at_longest_domain(
            domain in "[a-z0-9.\"\\\\-]{189}",
            secret in "[\"\\\\\\x00-\\x1f a-z]{0,64}",
        ) {
            let keys = keys();
            let entry = encode(&SystemCrypto, &keys, &domain, &secret, Utc::now()).unwrap();
            prop_assert_eq!(entry.ciphertext.len(), CIPHERTEXT_LEN);
            let back = decode(&SystemCrypto, &keys, &entry, &domain).unwrap();
            prop_assert_eq!(back.as_str(), secret.as_str());
        }

        #[test]
        fn unicode_secrets_roundtrip(
            domain in "\\PC{1,47}",
            secret in "\\PC{0,16}",
        ) {
            let keys = keys();
            let entry = encode(&SystemCrypto, &keys, &domain, &secret, Utc::now()).unwrap();
            let back = decode(&SystemCrypto, &keys, &entry, &domain).unwrap();
            prop_assert_eq!(back.as_str(), secret.as_str());
        }

        #[test]
        fn any_ascii_secret_roundtrips_at_fixed_length(
            domain in "[a-z0-9.-]{1,64}",
            secret in "[ -~]{0,64}",
        ) {
            let keys = keys();
            let entry = encode(&SystemCrypto, &keys, &domain, &secret, Utc::now()).unwrap();
            prop_assert_eq!(entry.ciphertext.len(), CIPHERTEXT_LEN);
            let back = decode(&SystemCrypto, &keys, &entry, &domain).unwrap();
            prop_assert_eq!(back.as_str(), secret.as_str());
        }
    }
}
