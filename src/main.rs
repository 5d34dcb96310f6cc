use clap::Parser;
use tracing_subscriber::EnvFilter;

use sitevault::cli::{commands, output, Cli, Commands};

/// Env var holding a `tracing` filter directive (e.g. `sitevault=debug`).
const LOG_ENV: &str = "SITEVAULT_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Set {
            ref domain,
            ref secret,
            generate,
        } => commands::set::execute(&cli, domain, secret.as_deref(), generate),
        Commands::Get { ref domain } => commands::get::execute(&cli, domain),
        Commands::Remove { ref domain, force } => commands::remove::execute(&cli, domain, force),
        Commands::List => commands::list::execute(&cli),
        Commands::Generate { length, no_special } => {
            commands::generate::execute(&cli, length, no_special)
        }
        Commands::Health => commands::health::execute(&cli),
        Commands::Verify => commands::verify::execute(&cli),
    };

    if let Err(e) = result {
        if e.is_tampering() {
            output::warning(
                "Wrong password, or the vault was tampered with. Restore it from a trusted copy if the password is right.",
            );
        }
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
