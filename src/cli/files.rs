//! On-disk home of a dumped vault.
//!
//! The engine itself does no I/O; the CLI keeps the canonical bytes in
//! `vault.json` and the freshness tag, as hex, in `vault.tag`. Both are
//! written to temp files and renamed into place so a reader never sees
//! a half-written pair.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, SiteVaultError};
use crate::vault::{FreshnessTag, VaultSnapshot};

const VAULT_FILE: &str = "vault.json";
const TAG_FILE: &str = "vault.tag";

/// Paths of the vault bytes and their tag.
#[derive(Debug, Clone)]
pub struct VaultFiles {
    dir: PathBuf,
    json: PathBuf,
    tag: PathBuf,
}

impl VaultFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            json: dir.join(VAULT_FILE),
            tag: dir.join(TAG_FILE),
        }
    }

    pub fn json_path(&self) -> &Path {
        &self.json
    }

    pub fn tag_path(&self) -> &Path {
        &self.tag
    }

    pub fn exists(&self) -> bool {
        self.json.exists()
    }

    /// Read the vault bytes and, if present, the stored tag.
    pub fn read(&self) -> Result<(Vec<u8>, Option<FreshnessTag>)> {
        if !self.json.exists() {
            return Err(SiteVaultError::VaultNotFound(self.json.clone()));
        }

        let bytes = fs::read(&self.json)?;
        let tag = if self.tag.exists() {
            Some(FreshnessTag::from_hex(&fs::read_to_string(&self.tag)?)?)
        } else {
            None
        };

        Ok((bytes, tag))
    }

    /// Write a snapshot atomically: temp file, then rename.
    ///
    /// The tag is written last, so a crash in between leaves new bytes
    /// with the old tag and the next open fails loudly instead of
    /// accepting unverified data.
    pub fn write(&self, snapshot: &VaultSnapshot) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        write_atomic(&self.json, &snapshot.bytes)?;
        write_atomic(&self.tag, format!("{}\n", snapshot.tag).as_bytes())?;
        Ok(())
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, data)?;

    // On Unix, restrict permissions to owner-only read/write.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot(bytes: &[u8], tag_byte: u8) -> VaultSnapshot {
        VaultSnapshot {
            bytes: bytes.to_vec(),
            tag: FreshnessTag::from_bytes([tag_byte; 32]),
        }
    }

    #[test]
    fn read_missing_vault_fails() {
        let tmp = TempDir::new().unwrap();
        let files = VaultFiles::in_dir(&tmp.path().join("v"));
        assert!(!files.exists());
        assert!(matches!(
            files.read().unwrap_err(),
            SiteVaultError::VaultNotFound(_)
        ));
    }

    #[test]
    fn write_then_read_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let files = VaultFiles::in_dir(&tmp.path().join("v"));
        files.write(&snapshot(b"{}", 0xAA)).unwrap();

        let (bytes, tag) = files.read().unwrap();
        assert_eq!(bytes, b"{}");
        assert_eq!(tag, Some(FreshnessTag::from_bytes([0xAA; 32])));
        assert!(!tmp.path().join("v/.vault.json.tmp").exists());
    }

    #[test]
    fn missing_tag_reads_as_none() {
        let tmp = TempDir::new().unwrap();
        let files = VaultFiles::in_dir(tmp.path());
        files.write(&snapshot(b"{}", 1)).unwrap();
        fs::remove_file(tmp.path().join(TAG_FILE)).unwrap();

        let (_, tag) = files.read().unwrap();
        assert!(tag.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn vault_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let files = VaultFiles::in_dir(tmp.path());
        files.write(&snapshot(b"{}", 1)).unwrap();

        let perms = fs::metadata(files.json_path()).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}
