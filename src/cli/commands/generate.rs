//! `sitevault generate`: print a random password. Needs no vault.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;
use crate::passwords::{check_strength, generate_password};

/// Execute the `generate` command.
pub fn execute(cli: &Cli, length: Option<usize>, no_special: bool) -> Result<()> {
    let ctx = Context::load(cli)?;

    let length = length.unwrap_or(ctx.settings.generator_length);
    let special = ctx.settings.generator_special && !no_special;

    let password = generate_password(length, special);
    println!("{password}");
    output::print_strength(&check_strength(&password));

    Ok(())
}
