//! Serialized vault form and the freshness tag that guards it.
//!
//! The canonical form is compact JSON:
//!
//! ```text
//! {"salt":"<base64>","entries":{"<token>":{"iv":..,"ciphertext":..,"mac":..,"createdAt":..}}}
//! ```
//!
//! Field order is fixed by the struct layout and entries are emitted in
//! token order, so the same vault state always renders to the same
//! bytes. `dump` pairs those bytes with `HMAC(masterKey, bytes)`.
//! Presenting an older dump alongside a newer tag fails verification,
//! which is what defeats rollback.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::LookupToken;
use super::entry::VaultEntry;
use super::padding::BLOCK_LEN;
use crate::crypto::kdf::SALT_LEN;
use crate::crypto::provider::{CryptoProvider, AEAD_TAG_LEN, MAC_LEN};
use crate::crypto::MasterKey;
use crate::errors::{Result, SiteVaultError};

/// Length of every stored ciphertext: one padded block plus the GCM tag.
pub const CIPHERTEXT_LEN: usize = BLOCK_LEN + AEAD_TAG_LEN;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A vault as read back from untrusted bytes.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultDocument {
    #[serde(deserialize_with = "base64_decode_array")]
    pub salt: [u8; SALT_LEN],

    #[serde(deserialize_with = "unique_entries")]
    pub entries: BTreeMap<LookupToken, VaultEntry>,
}

/// Borrowing twin of `VaultDocument` used when rendering.
#[derive(Serialize)]
struct VaultDocumentRef<'a> {
    #[serde(serialize_with = "base64_encode")]
    salt: &'a [u8; SALT_LEN],
    entries: &'a BTreeMap<LookupToken, VaultEntry>,
}

/// Render a vault state to its canonical bytes.
pub fn canonical_bytes(
    salt: &[u8; SALT_LEN],
    entries: &BTreeMap<LookupToken, VaultEntry>,
) -> Result<Vec<u8>> {
    serde_json::to_vec(&VaultDocumentRef { salt, entries })
        .map_err(|e| SiteVaultError::SerializationError(format!("vault: {e}")))
}

/// Parse and validate serialized vault bytes.
///
/// Anything outside the documented shape is rejected with
/// `InvalidInput`: unknown fields, wrong field sizes, malformed tokens,
/// duplicate tokens, ciphertexts of the wrong length.
pub fn parse_document(bytes: &[u8]) -> Result<VaultDocument> {
    let doc: VaultDocument = serde_json::from_slice(bytes)
        .map_err(|e| SiteVaultError::InvalidInput(format!("vault JSON: {e}")))?;

    if let Some((token, _)) = doc
        .entries
        .iter()
        .find(|(_, entry)| entry.ciphertext.len() != CIPHERTEXT_LEN)
    {
        return Err(SiteVaultError::InvalidInput(format!(
            "entry {} has a ciphertext of the wrong length (expected {CIPHERTEXT_LEN} bytes)",
            token.short()
        )));
    }

    Ok(doc)
}

// ---------------------------------------------------------------------------
// Freshness tag
// ---------------------------------------------------------------------------

/// HMAC-SHA256 of a dump under the master key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FreshnessTag([u8; MAC_LEN]);

impl FreshnessTag {
    pub fn from_bytes(bytes: [u8; MAC_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex-encoded tag (surrounding whitespace is ignored).
    pub fn from_hex(s: &str) -> Result<Self> {
        let raw = hex::decode(s.trim())
            .map_err(|e| SiteVaultError::InvalidInput(format!("freshness tag: {e}")))?;
        let bytes = <[u8; MAC_LEN]>::try_from(raw.as_slice()).map_err(|_| {
            SiteVaultError::InvalidInput(format!(
                "freshness tag must be {MAC_LEN} bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for FreshnessTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FreshnessTag({})", self.to_hex())
    }
}

impl fmt::Display for FreshnessTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for FreshnessTag {
    type Err = SiteVaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Output of `Vault::dump`: the canonical bytes and their tag.
#[derive(Debug, Clone)]
pub struct VaultSnapshot {
    pub bytes: Vec<u8>,
    pub tag: FreshnessTag,
}

/// Compute the freshness tag over `bytes`.
pub fn compute_tag<P: CryptoProvider + ?Sized>(
    provider: &P,
    master_key: &MasterKey,
    bytes: &[u8],
) -> Result<FreshnessTag> {
    provider
        .keyed_hash(master_key, &[bytes])
        .map(FreshnessTag::from_bytes)
}

/// Verify `expected` against the exact bytes supplied, in constant time.
pub fn verify_tag<P: CryptoProvider + ?Sized>(
    provider: &P,
    master_key: &MasterKey,
    bytes: &[u8],
    expected: &FreshnessTag,
) -> Result<()> {
    if provider.verify_keyed_hash(master_key, &[bytes], expected.as_bytes())? {
        Ok(())
    } else {
        Err(SiteVaultError::IntegrityFailed(
            "freshness tag does not match vault contents — stale or substituted state".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for the binary fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<T, S>(data: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data.as_ref()))
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn base64_decode_array<'de, D, const N: usize>(
    deserializer: D,
) -> std::result::Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    let bytes = base64_decode(deserializer)?;
    to_array(&bytes)
}

pub(crate) fn hex_encode<T, S>(data: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(data.as_ref()))
}

pub(crate) fn hex_decode_array<'de, D, const N: usize>(
    deserializer: D,
) -> std::result::Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
    to_array(&bytes)
}

fn to_array<E: serde::de::Error, const N: usize>(bytes: &[u8]) -> std::result::Result<[u8; N], E> {
    <[u8; N]>::try_from(bytes)
        .map_err(|_| E::custom(format!("expected {N} bytes, got {}", bytes.len())))
}

/// Deserialize the entries map, refusing duplicate tokens instead of
/// letting the last one win.
fn unique_entries<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<LookupToken, VaultEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = BTreeMap<LookupToken, VaultEntry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of lookup tokens to entries")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut entries = BTreeMap::new();
            while let Some((token, entry)) = map.next_entry::<LookupToken, VaultEntry>()? {
                if entries.contains_key(&token) {
                    return Err(serde::de::Error::custom(format!(
                        "duplicate lookup token {}",
                        token.short()
                    )));
                }
                entries.insert(token, entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SystemCrypto;

    #[test]
    fn empty_vault_renders_compactly() {
        let bytes = canonical_bytes(&[0u8; SALT_LEN], &BTreeMap::new()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"salt":"AAAAAAAAAAAAAAAAAAAAAA==","entries":{}}"#
        );
    }

    #[test]
    fn parse_roundtrips_empty_vault() {
        let bytes = canonical_bytes(&[7u8; SALT_LEN], &BTreeMap::new()).unwrap();
        let doc = parse_document(&bytes).unwrap();
        assert_eq!(doc.salt, [7u8; SALT_LEN]);
        assert!(doc.entries.is_empty());
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let json = br#"{"salt":"AAAAAAAAAAAAAAAAAAAAAA==","entries":{},"version":2}"#;
        assert!(matches!(
            parse_document(json).unwrap_err(),
            SiteVaultError::InvalidInput(_)
        ));
    }

    #[test]
    fn parse_rejects_short_salt() {
        let json = br#"{"salt":"AAAA","entries":{}}"#;
        assert!(matches!(
            parse_document(json).unwrap_err(),
            SiteVaultError::InvalidInput(_)
        ));
    }

    #[test]
    fn parse_rejects_missing_fields_and_non_objects() {
        for json in [
            br#"{"entries":{}}"#.as_slice(),
            br#"{"salt":"AAAAAAAAAAAAAAAAAAAAAA=="}"#.as_slice(),
            br#""a string""#.as_slice(),
            b"not json".as_slice(),
        ] {
            assert!(matches!(
                parse_document(json).unwrap_err(),
                SiteVaultError::InvalidInput(_)
            ));
        }
    }

    #[test]
    fn tag_verifies_only_matching_bytes() {
        let key = MasterKey::from_bytes([3; 32]);
        let tag = compute_tag(&SystemCrypto, &key, b"state-1").unwrap();
        assert!(verify_tag(&SystemCrypto, &key, b"state-1", &tag).is_ok());
        assert!(matches!(
            verify_tag(&SystemCrypto, &key, b"state-2", &tag).unwrap_err(),
            SiteVaultError::IntegrityFailed(_)
        ));
    }

    #[test]
    fn tag_hex_roundtrip() {
        let tag = FreshnessTag::from_bytes([0xAB; MAC_LEN]);
        let parsed: FreshnessTag = format!(" {tag}\n").parse().unwrap();
        assert_eq!(parsed, tag);
        assert!(FreshnessTag::from_hex("abcd").is_err());
        assert!(FreshnessTag::from_hex("zz").is_err());
    }
}
