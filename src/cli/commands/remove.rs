//! `sitevault remove`: delete the secret stored for a domain.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{Result, SiteVaultError};

/// Execute the `remove` command.
pub fn execute(cli: &Cli, domain: &str, force: bool) -> Result<()> {
    let ctx = Context::load(cli)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove secret for '{domain}'?"))
            .default(false)
            .interact()
            .map_err(|e| SiteVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let mut vault = ctx.open_vault()?;
    if !vault.remove(domain)? {
        return Err(SiteVaultError::CommandFailed(format!(
            "no secret stored for '{domain}'"
        )));
    }
    ctx.save_vault(&vault)?;

    output::success(&format!(
        "Removed secret for '{domain}' ({} remaining)",
        vault.len()
    ));

    Ok(())
}
