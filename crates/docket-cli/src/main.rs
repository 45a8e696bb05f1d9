//! Docket CLI - Configure tenants and run document extraction batches.

use clap::Parser;
use docket_cli::commands;
use docket_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> docket_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load config
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    // Determine output format and color
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let service = config.open_service(config.gateway()?)?;

    match cli.command {
        Command::Tenants(args) => commands::execute_tenants(args, &service, &formatter)?,
        Command::Config(args) => commands::execute_config(args, &service, &formatter)?,
        Command::Run(args) => commands::execute_run(args, &service, &formatter).await?,
        Command::RunAll => commands::execute_run_all(&service, &formatter).await?,
        Command::Results(args) => commands::execute_results(args, &service, &formatter).await?,
    }

    Ok(())
}
