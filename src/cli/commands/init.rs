//! `sitevault init`: create a new, empty vault.

use crate::cli::output;
use crate::cli::{prompt_new_password, Cli, Context};
use crate::crypto::SystemCrypto;
use crate::errors::{Result, SiteVaultError};
use crate::vault::Vault;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;

    // 1. Refuse to overwrite an existing vault.
    if ctx.files.exists() {
        output::tip("Use `sitevault set` to add secrets to the existing vault.");
        return Err(SiteVaultError::VaultAlreadyExists(
            ctx.files.json_path().to_path_buf(),
        ));
    }

    // 2. Prompt for a new password (with confirmation).
    let password = prompt_new_password()?;

    // 3. Derive keys and write the empty vault with its tag.
    let vault = Vault::init_with(&password, &ctx.settings.kdf_params(), SystemCrypto)?;
    ctx.save_vault(&vault)?;

    output::success(&format!(
        "Vault created at {}",
        ctx.files.json_path().display()
    ));
    output::tip("Add a secret: sitevault set <DOMAIN>");

    Ok(())
}
