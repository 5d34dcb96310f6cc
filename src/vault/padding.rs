//! Fixed-block padding that hides the length of a stored secret.
//!
//! Every entry payload is padded to exactly `BLOCK_LEN` bytes before
//! encryption, so all ciphertexts in a vault have the same size.
//!
//! The last byte holds the pad length `n`, and each of the last `n`
//! bytes equals `n`. At least one pad byte is always written, so the
//! final byte is never payload and a full-size payload is refused.

use zeroize::Zeroizing;

use crate::errors::{Result, SiteVaultError};

/// Size of every padded plaintext block.
pub const BLOCK_LEN: usize = 256;

/// Largest payload that still leaves room for one pad byte.
pub const MAX_PAYLOAD_LEN: usize = BLOCK_LEN - 1;

/// Pad `payload` to `BLOCK_LEN` bytes.
pub fn pad(payload: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(SiteVaultError::InvalidInput(format!(
            "entry payload is {} bytes, capacity is {MAX_PAYLOAD_LEN}",
            payload.len()
        )));
    }

    let pad_len = u8::try_from(BLOCK_LEN - payload.len()).map_err(|_| {
        SiteVaultError::InvalidInput("entry payload is too short to pad".into())
    })?;

    let mut block = Zeroizing::new(Vec::with_capacity(BLOCK_LEN));
    block.extend_from_slice(payload);
    block.resize(BLOCK_LEN, pad_len);
    Ok(block)
}

/// Strip the padding from a decrypted block.
pub fn unpad(block: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if block.len() != BLOCK_LEN {
        return Err(SiteVaultError::PaddingInvalid(format!(
            "block is {} bytes, expected {BLOCK_LEN}",
            block.len()
        )));
    }

    let pad_len = usize::from(block[BLOCK_LEN - 1]);
    if pad_len == 0 || pad_len > MAX_PAYLOAD_LEN {
        return Err(SiteVaultError::PaddingInvalid(format!(
            "pad length byte {pad_len} out of range"
        )));
    }

    let (payload, padding) = block.split_at(BLOCK_LEN - pad_len);
    if padding.iter().any(|&b| usize::from(b) != pad_len) {
        return Err(SiteVaultError::PaddingInvalid(
            "pad bytes disagree with length byte".into(),
        ));
    }

    Ok(Zeroizing::new(payload.to_vec()))
}
