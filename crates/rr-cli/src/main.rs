use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rr_cli::commands::{check, legs, prizes, results};
use rr_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = cli.config.as_deref();
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Results { races, json, notes }) => {
            results::run(&mut stdout, races, config, *json, *notes)?;
        }
        Some(Commands::Prizes { race, json }) => {
            prizes::run(&mut stdout, race, config, *json)?;
        }
        Some(Commands::Legs { race, leg, json }) => {
            legs::run(&mut stdout, race, config, *leg, *json)?;
        }
        Some(Commands::Check { race }) => {
            check::run(&mut stdout, race, config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
