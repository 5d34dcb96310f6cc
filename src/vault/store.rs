//! High-level vault operations.
//!
//! `Vault` ties the crypto layer, the entry codec and the serialized
//! form together so callers work with plain calls like
//! `vault.set("bank.com", "hunter2")`.
//!
//! The engine does no I/O and no internal locking. Mutating calls take
//! `&mut self`, so only one `set`/`remove` can be in flight per vault;
//! `get`, `entries` and `dump` take `&self` and may run side by side.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::kdf::SALT_LEN;
use crate::crypto::provider::MAC_LEN;
use crate::crypto::{derive_key_material, CryptoProvider, KdfParams, KeyMaterial, SystemCrypto};
use crate::errors::{Result, SiteVaultError};

use super::domain::{hash_domain, validate_domain, LookupToken};
use super::entry::{self, DecryptedEntry, VaultEntry};
use super::format::{self, FreshnessTag, VaultSnapshot};

/// Label hashed under the master key to recognise the passphrase on
/// `unlock`, including for a vault with no entries.
const UNLOCK_CHECK_LABEL: &[u8] = b"sitevault-unlock-check";

/// An open vault: the public structure plus, while unlocked, the key
/// material derived from the passphrase.
pub struct Vault<P: CryptoProvider = SystemCrypto> {
    /// Salt for PBKDF2, stored in the clear.
    salt: [u8; SALT_LEN],

    /// Lookup token -> encrypted entry.
    entries: BTreeMap<LookupToken, VaultEntry>,

    /// Derived keys; `None` while locked. Zeroized on drop.
    keys: Option<KeyMaterial>,

    /// KDF settings used to (re)derive `keys`.
    params: KdfParams,

    /// HMAC(masterKey, UNLOCK_CHECK_LABEL) for the current key material.
    /// In memory only; never serialized.
    unlock_check: [u8; MAC_LEN],

    provider: P,
}

impl Vault<SystemCrypto> {
    /// Create an empty vault with default KDF parameters.
    pub fn init(passphrase: &str) -> Result<Self> {
        Self::init_with(passphrase, &KdfParams::default(), SystemCrypto)
    }

    /// Rehydrate a dumped vault with default KDF parameters.
    ///
    /// When `tag` is given it must match the bytes exactly, otherwise
    /// the load fails with `IntegrityFailed`.
    pub fn load(passphrase: &str, bytes: &[u8], tag: Option<&FreshnessTag>) -> Result<Self> {
        Self::load_with(passphrase, bytes, tag, &KdfParams::default(), SystemCrypto)
    }
}

impl<P: CryptoProvider> Vault<P> {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create an empty vault.
    ///
    /// Draws a fresh salt from `provider` and derives the key material.
    pub fn init_with(passphrase: &str, params: &KdfParams, provider: P) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        provider.fill_random(&mut salt)?;

        let keys = derive_key_material(passphrase.as_bytes(), &salt, params)?;
        let unlock_check = unlock_check(&provider, &keys)?;
        debug!(iterations = params.iterations, "initialized empty vault");

        Ok(Self {
            salt,
            entries: BTreeMap::new(),
            keys: Some(keys),
            params: *params,
            unlock_check,
            provider,
        })
    }

    /// Parse serialized bytes, re-derive keys from the embedded salt and,
    /// if a tag is supplied, check it over the exact bytes given.
    pub fn load_with(
        passphrase: &str,
        bytes: &[u8],
        tag: Option<&FreshnessTag>,
        params: &KdfParams,
        provider: P,
    ) -> Result<Self> {
        let doc = format::parse_document(bytes)?;
        let keys = derive_key_material(passphrase.as_bytes(), &doc.salt, params)?;

        // Verify over the raw input rather than a re-rendering of it.
        if let Some(expected) = tag {
            format::verify_tag(&provider, keys.master_key(), bytes, expected)?;
        }

        let unlock_check = unlock_check(&provider, &keys)?;
        debug!(
            entries = doc.entries.len(),
            tag_checked = tag.is_some(),
            "loaded vault"
        );

        Ok(Self {
            salt: doc.salt,
            entries: doc.entries,
            keys: Some(keys),
            params: *params,
            unlock_check,
            provider,
        })
    }

    // ------------------------------------------------------------------
    // Entry operations
    // ------------------------------------------------------------------

    /// Return the secret stored for `domain`, or `None` if there is none.
    ///
    /// A domain that `set` would refuse (empty or too long) can never
    /// have been stored, so it is simply absent.
    pub fn get(&self, domain: &str) -> Result<Option<Zeroizing<String>>> {
        let keys = self.keys()?;
        let Some(token) = self.lookup_token(keys, domain)? else {
            return Ok(None);
        };

        match self.entries.get(&token) {
            Some(entry) => entry::decode(&self.provider, keys, entry, domain).map(Some),
            None => Ok(None),
        }
    }

    /// Store `secret` for `domain`, replacing any previous value.
    ///
    /// The entry is fully built before the map is touched, so a failure
    /// leaves the vault unchanged. An overwrite keeps the original
    /// `createdAt`.
    pub fn set(&mut self, domain: &str, secret: &str) -> Result<()> {
        let keys = self.keys()?;
        let token = hash_domain(&self.provider, keys.mac_key(), domain)?;

        let created_at = self
            .entries
            .get(&token)
            .map_or_else(Utc::now, |existing| existing.created_at);

        let new_entry = entry::encode(&self.provider, keys, domain, secret, created_at)?;
        debug!(token = token.short(), "stored entry");
        self.entries.insert(token, new_entry);
        Ok(())
    }

    /// Remove the entry for `domain`. Returns whether one existed.
    pub fn remove(&mut self, domain: &str) -> Result<bool> {
        let keys = self.keys()?;
        let Some(token) = self.lookup_token(keys, domain)? else {
            return Ok(false);
        };

        let found = self.entries.remove(&token).is_some();
        debug!(token = token.short(), found, "removed entry");
        Ok(found)
    }

    /// Returns `true` if an entry exists for `domain`.
    ///
    /// Only the token is computed, nothing is decrypted.
    pub fn contains(&self, domain: &str) -> Result<bool> {
        let keys = self.keys()?;
        Ok(self
            .lookup_token(keys, domain)?
            .is_some_and(|token| self.entries.contains_key(&token)))
    }

    /// Decrypt every entry, sorted by domain.
    ///
    /// Each entry must hash back to the token it is stored under and
    /// carry a valid MAC; the first failure aborts the whole call.
    pub fn entries(&self) -> Result<Vec<DecryptedEntry>> {
        let keys = self.keys()?;

        let mut out = self
            .entries
            .iter()
            .map(|(token, stored)| entry::decode_at(&self.provider, keys, token, stored))
            .collect::<Result<Vec<_>>>()?;

        out.sort_by(|a, b| a.domain.cmp(&b.domain));
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Render the vault to canonical bytes and tag them with the master
    /// key.
    pub fn dump(&self) -> Result<VaultSnapshot> {
        let keys = self.keys()?;
        let bytes = format::canonical_bytes(&self.salt, &self.entries)?;
        let tag = format::compute_tag(&self.provider, keys.master_key(), &bytes)?;

        debug!(entries = self.entries.len(), bytes = bytes.len(), "dumped vault");
        Ok(VaultSnapshot { bytes, tag })
    }

    // ------------------------------------------------------------------
    // Key material lifecycle
    // ------------------------------------------------------------------

    /// Drop the key material. Every operation that needs keys fails with
    /// `Capability` until `unlock` succeeds.
    pub fn lock(&mut self) {
        if self.keys.take().is_some() {
            debug!("vault locked");
        }
    }

    /// Re-derive the key material from `passphrase` and the vault's salt.
    ///
    /// If the vault holds entries, the first one must decrypt under the
    /// new keys. An empty vault is checked against the unlock check
    /// value recorded while it was last unlocked. On failure the vault
    /// stays locked.
    pub fn unlock(&mut self, passphrase: &str) -> Result<()> {
        let keys = derive_key_material(passphrase.as_bytes(), &self.salt, &self.params)?;

        if let Some((token, stored)) = self.entries.iter().next() {
            entry::decode_at(&self.provider, &keys, token, stored)?;
        } else if !self.provider.verify_keyed_hash(
            keys.master_key(),
            &[UNLOCK_CHECK_LABEL],
            &self.unlock_check,
        )? {
            return Err(SiteVaultError::DecryptionFailed);
        }

        self.unlock_check = unlock_check(&self.provider, &keys)?;
        self.keys = Some(keys);
        debug!("vault unlocked");
        Ok(())
    }

    /// Returns `true` while no key material is held.
    pub fn is_locked(&self) -> bool {
        self.keys.is_none()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the number of entries in the vault.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the vault holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the PBKDF2 salt.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Token for a read path, or `None` for a domain no entry can have.
    fn lookup_token(&self, keys: &KeyMaterial, domain: &str) -> Result<Option<LookupToken>> {
        if validate_domain(domain).is_err() {
            return Ok(None);
        }
        hash_domain(&self.provider, keys.mac_key(), domain).map(Some)
    }

    fn keys(&self) -> Result<&KeyMaterial> {
        self.keys.as_ref().ok_or_else(|| {
            SiteVaultError::Capability("vault is locked — unlock it with the passphrase first".into())
        })
    }
}

fn unlock_check<P: CryptoProvider + ?Sized>(provider: &P, keys: &KeyMaterial) -> Result<[u8; MAC_LEN]> {
    provider.keyed_hash(keys.master_key(), &[UNLOCK_CHECK_LABEL])
}

impl<P: CryptoProvider> fmt::Debug for Vault<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("entries", &self.entries.len())
            .field("locked", &self.is_locked())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
