use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crypto::kdf::{KdfParams, MIN_ITERATIONS};
use crate::errors::{Result, SiteVaultError};

/// Project-level configuration, loaded from `.sitevault.toml`.
///
/// Every field has a sensible default so SiteVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory (relative to project root) holding `vault.json` and
    /// `vault.tag`.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// PBKDF2 iteration count (default and minimum: 100 000).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Length of passwords from `sitevault generate` (default: 16).
    #[serde(default = "default_generator_length")]
    pub generator_length: usize,

    /// Whether generated passwords include special characters.
    #[serde(default = "default_generator_special")]
    pub generator_special: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".sitevault".to_string()
}

fn default_kdf_iterations() -> u32 {
    MIN_ITERATIONS
}

fn default_generator_length() -> usize {
    16
}

fn default_generator_special() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            kdf_iterations: default_kdf_iterations(),
            generator_length: default_generator_length(),
            generator_special: default_generator_special(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".sitevault.toml";

    /// Load settings from `<project_dir>/.sitevault.toml`.
    ///
    /// If the file does not exist, defaults are returned. If it exists
    /// but cannot be parsed, or asks for fewer than 100 000 PBKDF2
    /// iterations, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SiteVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.kdf_iterations < MIN_ITERATIONS {
            return Err(SiteVaultError::ConfigError(format!(
                "kdf_iterations must be at least {MIN_ITERATIONS} (got {})",
                settings.kdf_iterations
            )));
        }

        Ok(settings)
    }

    /// Directory holding the vault files.
    ///
    /// Example: `project_dir/.sitevault`
    pub fn vault_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// Convert the KDF settings into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            iterations: self.kdf_iterations,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.vault_dir, ".sitevault");
        assert_eq!(s.kdf_iterations, 100_000);
        assert_eq!(s.generator_length, 16);
        assert!(s.generator_special);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, ".sitevault");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
vault_dir = "secrets"
kdf_iterations = 250000
generator_length = 24
generator_special = false
"#;
        fs::write(tmp.path().join(".sitevault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, "secrets");
        assert_eq!(settings.kdf_iterations, 250_000);
        assert_eq!(settings.generator_length, 24);
        assert!(!settings.generator_special);
        assert_eq!(settings.kdf_params().iterations, 250_000);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".sitevault.toml"), "vault_dir = \"v\"\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, "v");
        assert_eq!(settings.kdf_iterations, 100_000);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".sitevault.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_weak_kdf() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".sitevault.toml"), "kdf_iterations = 1000\n").unwrap();
        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(matches!(err, SiteVaultError::ConfigError(_)));
    }

    #[test]
    fn vault_dir_respects_config() {
        let s = Settings {
            vault_dir: "secrets".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            s.vault_dir(Path::new("/home/user/project")),
            PathBuf::from("/home/user/project/secrets")
        );
    }
}
