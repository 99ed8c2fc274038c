use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use rssnap::cli::Cli;
use rssnap::commands::run_command;
use rssnap::config;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let cli = Cli::parse();

    let mut cfg = config::load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut cfg);

    run_command(&cli, &cfg)
}
