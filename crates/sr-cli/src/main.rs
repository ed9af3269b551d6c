use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sr_cli::commands::{normalize, report, summary, zones};
use sr_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so `report --stdout` output stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Report(args)) => {
            let config =
                Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
            tracing::debug!(?config, "loaded configuration");
            report::run(args, &config)?;
        }
        Some(Commands::Summary { input, json }) => {
            summary::run(input, *json)?;
        }
        Some(Commands::Zones { dst }) => {
            zones::run(*dst)?;
        }
        Some(Commands::Normalize { values }) => {
            normalize::run(values);
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
