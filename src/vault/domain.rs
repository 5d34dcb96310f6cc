//! Domain hiding: site identifiers are never stored, only their
//! HMAC under the vault's MAC key.
//!
//! Two vaults with different passphrases produce unrelated tokens for
//! the same domain, so serialized vaults can't be linked or matched
//! against a precomputed table of popular sites.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::provider::{CryptoProvider, MAC_LEN};
use crate::crypto::MacKey;
use crate::errors::{Result, SiteVaultError};

/// Longest domain we accept, in bytes.
///
/// Bounded by the padded block: a 189-byte domain plus a 64-byte secret
/// and their two length bytes fill the 255 bytes a block can carry.
pub const MAX_DOMAIN_LEN: usize = 189;

/// Length of a rendered token: one hex pair per HMAC byte.
pub const TOKEN_HEX_LEN: usize = MAC_LEN * 2;

/// Opaque lookup key for one entry: lowercase hex of HMAC(macKey, domain).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupToken(String);

impl LookupToken {
    /// Parse a token read from untrusted input.
    ///
    /// Only the exact form we produce is accepted: 64 lowercase hex
    /// characters.
    pub fn parse(s: &str) -> Result<Self> {
        let well_formed = s.len() == TOKEN_HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(SiteVaultError::InvalidInput(format!(
                "lookup token must be {TOKEN_HEX_LEN} lowercase hex characters"
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }

    fn from_mac(mac: &[u8; MAC_LEN]) -> Self {
        Self(hex::encode(mac))
    }
}

impl fmt::Display for LookupToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for LookupToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LookupToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        LookupToken::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Validate that a domain is usable as an entry identifier.
pub fn validate_domain(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(SiteVaultError::InvalidInput("domain cannot be empty".into()));
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(SiteVaultError::InvalidInput(format!(
            "domain cannot exceed {MAX_DOMAIN_LEN} bytes (got {})",
            domain.len()
        )));
    }
    Ok(())
}

/// Map a domain to its lookup token.
pub fn hash_domain<P: CryptoProvider + ?Sized>(
    provider: &P,
    mac_key: &MacKey,
    domain: &str,
) -> Result<LookupToken> {
    validate_domain(domain)?;
    let mac = provider.keyed_hash(mac_key, &[domain.as_bytes()])?;
    Ok(LookupToken::from_mac(&mac))
}
