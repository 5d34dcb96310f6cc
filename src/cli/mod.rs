//! CLI module: Clap argument parser, output helpers, vault file handling,
//! and command implementations.

pub mod commands;
pub mod files;
pub mod output;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::SystemCrypto;
use crate::errors::{Result, SiteVaultError};
use crate::vault::Vault;

use files::VaultFiles;

/// Minimum master password length for new vaults.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable checked before prompting for the password.
pub const PASSWORD_ENV: &str = "SITEVAULT_PASSWORD";

/// SiteVault CLI: per-site secret vault with tamper detection.
#[derive(Parser)]
#[command(
    name = "sitevault",
    about = "Per-site secret vault with swap and rollback detection",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (overrides `vault_dir` in .sitevault.toml)
    #[arg(long, global = true, env = "SITEVAULT_DIR")]
    pub vault_dir: Option<String>,

    /// Log engine activity to stderr (same as SITEVAULT_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Open a vault whose freshness tag file is missing (no rollback check)
    #[arg(long, global = true)]
    pub allow_untagged: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// Store a secret for a domain (add or overwrite)
    Set {
        /// Domain the secret belongs to (e.g. bank.com)
        domain: String,
        /// Secret value (omit for interactive prompt)
        secret: Option<String>,
        /// Store a freshly generated password instead
        #[arg(short, long, conflicts_with = "secret")]
        generate: bool,
    },

    /// Print the secret stored for a domain
    Get {
        /// Domain to look up
        domain: String,
    },

    /// Remove the secret stored for a domain
    Remove {
        /// Domain to remove
        domain: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// List stored domains
    List,

    /// Generate a random password
    Generate {
        /// Password length (8-64)
        #[arg(short, long)]
        length: Option<usize>,
        /// Letters and digits only
        #[arg(long)]
        no_special: bool,
    },

    /// Report weak and reused secrets
    Health,

    /// Check the freshness tag and every entry
    Verify,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Everything a command needs to find and open the vault.
pub struct Context {
    pub settings: Settings,
    pub files: VaultFiles,
    allow_untagged: bool,
}

impl Context {
    /// Resolve settings and vault file paths from the current directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let mut settings = Settings::load(&cwd)?;
        if let Some(dir) = &cli.vault_dir {
            settings.vault_dir.clone_from(dir);
        }
        let files = VaultFiles::in_dir(&settings.vault_dir(&cwd));
        Ok(Self {
            settings,
            files,
            allow_untagged: cli.allow_untagged,
        })
    }

    /// Prompt for the password and open the vault, checking the stored
    /// freshness tag.
    ///
    /// A missing tag file fails with `IntegrityFailed` unless
    /// `--allow-untagged` was given; deleting the tag must not switch off
    /// rollback detection.
    pub fn open_vault(&self) -> Result<Vault> {
        let (bytes, tag) = self.files.read()?;
        if tag.is_none() {
            if !self.allow_untagged {
                return Err(SiteVaultError::IntegrityFailed(format!(
                    "freshness tag file {} is missing; refusing to open \
                     (pass --allow-untagged to override)",
                    self.files.tag_path().display()
                )));
            }
            output::warning("No freshness tag found; rollback cannot be detected.");
        }

        let password = prompt_password()?;
        Vault::load_with(
            &password,
            &bytes,
            tag.as_ref(),
            &self.settings.kdf_params(),
            SystemCrypto,
        )
    }

    /// Dump the vault and write it back to disk.
    pub fn save_vault(&self, vault: &Vault) -> Result<()> {
        let snapshot = vault.dump()?;
        self.files.write(&snapshot)
    }
}

/// Get the vault password, trying in order:
/// 1. `SITEVAULT_PASSWORD` env var (scripts/CI)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault password")
        .interact()
        .map_err(|e| SiteVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used during `init`).
///
/// Also respects `SITEVAULT_PASSWORD` for scripted usage.
/// Enforces a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        if pw.len() < MIN_PASSWORD_LEN {
            return Err(SiteVaultError::CommandFailed(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose vault password")
            .with_confirmation(
                "Confirm vault password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| SiteVaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

fn password_from_env() -> Option<Zeroizing<String>> {
    match std::env::var(PASSWORD_ENV) {
        Ok(pw) if !pw.is_empty() => Some(Zeroizing::new(pw)),
        _ => None,
    }
}
