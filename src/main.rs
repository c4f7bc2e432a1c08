mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use logsink::config::Config;
use logsink::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // The configured filter is only known once the config is loaded
    let config = observability::with_bootstrap_tracing(|| Config::load_with(cli.config))?;
    observability::init_tracing(&config.telemetry.log_filter);

    match cli.command {
        Commands::Server(args) => logsink::api::run(config, args.address).await?,
    }

    Ok(())
}
