use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in SiteVault.
#[derive(Debug, Error)]
pub enum SiteVaultError {
    // --- Engine errors ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Key material unavailable: {0}")]
    Capability(String),

    #[error("Decryption failed — wrong password or corrupted entry")]
    DecryptionFailed,

    #[error("Swap attack detected — entry does not belong to the requested domain")]
    SwapAttack,

    #[error("Integrity check failed: {0}")]
    IntegrityFailed(String),

    #[error("Invalid padding: {0}")]
    PaddingInvalid(String),

    // --- Vault file errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl SiteVaultError {
    /// True for the errors that mean stored data was altered or relocated.
    pub fn is_tampering(&self) -> bool {
        matches!(
            self,
            Self::SwapAttack | Self::IntegrityFailed(_) | Self::DecryptionFailed
        )
    }
}

/// Convenience type alias for SiteVault results.
pub type Result<T> = std::result::Result<T, SiteVaultError>;
