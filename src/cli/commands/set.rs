//! `sitevault set`: add or overwrite the secret for a domain.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{Result, SiteVaultError};
use crate::passwords::{check_strength, generate_password, is_reused};

/// Execute the `set` command.
pub fn execute(cli: &Cli, domain: &str, secret: Option<&str>, generate: bool) -> Result<()> {
    let ctx = Context::load(cli)?;

    // Determine the secret from one of four sources.
    let value: Zeroizing<String> = if generate {
        Zeroizing::new(generate_password(
            ctx.settings.generator_length,
            ctx.settings.generator_special,
        ))
    } else if let Some(v) = secret {
        output::warning("Secret provided on command line — it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.trim_end().to_string())
    } else {
        let v = dialoguer::Password::new()
            .with_prompt(format!("Enter secret for {domain}"))
            .interact()
            .map_err(|e| SiteVaultError::CommandFailed(format!("input prompt: {e}")))?;
        Zeroizing::new(v)
    };

    let mut vault = ctx.open_vault()?;

    // Reuse check against every other domain's secret.
    let entries = vault.entries()?;
    let others: Vec<&str> = entries
        .iter()
        .filter(|e| e.domain != domain)
        .map(|e| e.secret.as_str())
        .collect();
    if is_reused(&value, &others) {
        output::warning("This secret is already used for another domain.");
    }

    let existed = vault.contains(domain)?;
    vault.set(domain, &value)?;
    ctx.save_vault(&vault)?;

    let verb = if existed { "updated" } else { "added" };
    output::success(&format!(
        "Secret for '{domain}' {verb} ({} total)",
        vault.len()
    ));

    if generate {
        println!("{}", value.as_str());
    }
    output::print_strength(&check_strength(&value));

    Ok(())
}
