//! fleetprint CLI entry point.

use anyhow::Result;
use clap::Parser;

use fleetprint::cli::{commands, handle_error, Cli, Commands, Session};
use fleetprint::domain::models::{Config, Credentials};
use fleetprint::infrastructure::config::ConfigLoader;
use fleetprint::infrastructure::logging::{LogConfig, LoggerImpl};

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let session = Session {
        config,
        credentials: cli.token.clone().map(Credentials::token),
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Extract(args) => commands::extract::execute(args, &session).await,
        Commands::Check(args) => commands::check::execute(args, &session).await,
        Commands::Apply(args) => commands::apply::execute(args, &session).await,
        Commands::Land(args) => commands::land::execute(args, &session).await,
    };

    if let Err(err) = result {
        handle_error(err, session.json);
    }
}
