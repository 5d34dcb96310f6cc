//! `sitevault list`: show every stored domain with its creation time.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let vault = ctx.open_vault()?;

    let entries = vault.entries()?;
    output::print_entries_table(&entries);

    Ok(())
}
