//! `sitevault get`: print the secret stored for one domain.

use crate::cli::{Cli, Context};
use crate::errors::{Result, SiteVaultError};

/// Execute the `get` command.
pub fn execute(cli: &Cli, domain: &str) -> Result<()> {
    let ctx = Context::load(cli)?;
    let vault = ctx.open_vault()?;

    // Decrypt and print the secret value to stdout.
    match vault.get(domain)? {
        Some(secret) => {
            println!("{}", secret.as_str());
            Ok(())
        }
        None => Err(SiteVaultError::CommandFailed(format!(
            "no secret stored for '{domain}'"
        ))),
    }
}
