use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cw_cli::commands::{archive, channel, ignore, rebuild, reconstruct, report, status, top, watch};
use cw_cli::{Cli, Commands, Config, IgnoreAction};

fn main() -> Result<()> {
    let cli = Cli::parse();

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

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Watch { channel } => watch::run(&mut out, &config, channel.as_deref())?,
        Commands::Top { limit, json } => top::run(&mut out, &config, *limit, *json)?,
        Commands::Report => report::run(&mut out, &config)?,
        Commands::Reconstruct { log, force_close } => {
            reconstruct::run(&mut out, &config, log.as_deref(), *force_close)?;
        }
        Commands::Archive => archive::run(&mut out, &config)?,
        Commands::Rebuild { log, force_close } => {
            rebuild::run(&mut out, &config, log.as_deref(), *force_close)?;
        }
        Commands::Ignore(action) => match action {
            IgnoreAction::Add { name } => ignore::add(&mut out, &config, name)?,
            IgnoreAction::Remove { name } => ignore::remove(&mut out, &config, name)?,
            IgnoreAction::List => ignore::list(&mut out, &config)?,
        },
        Commands::Status => status::run(&mut out, &config)?,
        Commands::Channel { login } => channel::run(&mut out, &config, login)?,
    }

    Ok(())
}
