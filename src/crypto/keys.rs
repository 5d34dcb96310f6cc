//! Key hierarchy derived from the passphrase.
//!
//! From a single PBKDF2 master key we derive:
//! - A **MAC key** for lookup tokens and per-entry MACs.
//! - An **encryption key** for AES-256-GCM.
//!
//! Each key type is restricted to one role: `EncKey` only implements
//! `AeadKey`, while `MacKey` and `MasterKey` only implement `HashKey`.
//! The provider traits accept nothing else, so a key can't be handed to
//! the wrong primitive by accident.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf::{derive_master_key_with_params, KdfParams, KEY_LEN, SALT_LEN};
use crate::errors::{Result, SiteVaultError};

/// HKDF label for the MAC subkey.
const MAC_LABEL: &[u8] = b"mac";

/// HKDF label for the encryption subkey.
const ENC_LABEL: &[u8] = b"enc";

mod sealed {
    pub trait Sealed {}
}

/// A key usable with keyed hashing (HMAC-SHA256).
pub trait HashKey: sealed::Sealed {
    #[doc(hidden)]
    fn hash_key_bytes(&self) -> &[u8; KEY_LEN];
}

/// A key usable with authenticated encryption (AES-256-GCM).
pub trait AeadKey: sealed::Sealed {
    #[doc(hidden)]
    fn aead_key_bytes(&self) -> &[u8; KEY_LEN];
}

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Zeroize, ZeroizeOnDrop)]
        pub struct $name {
            bytes: [u8; KEY_LEN],
        }

        impl $name {
            /// Wrap raw key bytes.
            pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
                Self { bytes }
            }
        }

        impl sealed::Sealed for $name {}

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "([REDACTED])"))
            }
        }
    };
}

key_type!(
    /// PBKDF2 output. Signs and verifies the freshness tag.
    MasterKey
);
key_type!(
    /// Subkey for lookup tokens and entry MACs.
    MacKey
);
key_type!(
    /// Subkey for AES-256-GCM.
    EncKey
);

impl HashKey for MasterKey {
    fn hash_key_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl HashKey for MacKey {
    fn hash_key_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl AeadKey for EncKey {
    fn aead_key_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// All key material for one unlocked vault. Zeroized on drop.
#[derive(Clone, Debug)]
pub struct KeyMaterial {
    master: MasterKey,
    mac: MacKey,
    enc: EncKey,
}

impl KeyMaterial {
    /// Derive the subkeys from an already-stretched master key.
    pub fn from_master(master: MasterKey) -> Result<Self> {
        let mac = MacKey::from_bytes(hkdf_expand(master.hash_key_bytes(), MAC_LABEL)?);
        let enc = EncKey::from_bytes(hkdf_expand(master.hash_key_bytes(), ENC_LABEL)?);
        Ok(Self { master, mac, enc })
    }

    pub fn master_key(&self) -> &MasterKey {
        &self.master
    }

    pub fn mac_key(&self) -> &MacKey {
        &self.mac
    }

    pub fn enc_key(&self) -> &EncKey {
        &self.enc
    }
}

/// Run PBKDF2 over the passphrase and expand the result into the full
/// key hierarchy.
pub fn derive_key_material(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<KeyMaterial> {
    let mut master_bytes = derive_master_key_with_params(passphrase, salt, params)?;
    let master = MasterKey::from_bytes(master_bytes);
    master_bytes.zeroize();
    KeyMaterial::from_master(master)
}

/// HKDF-SHA256 expand with a fixed label.
///
/// The extract step is skipped on purpose: the input already came out of
/// PBKDF2 and is uniformly random.
fn hkdf_expand(ikm: &[u8], label: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(label, &mut okm)
        .map_err(|e| SiteVaultError::Capability(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}
