//! `sitevault health`: score the vault for weak and reused secrets.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;
use crate::passwords::SecurityHealth;

/// Execute the `health` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let vault = ctx.open_vault()?;

    let health = SecurityHealth::assess(&vault.entries()?);
    output::print_health(&health);

    Ok(())
}
