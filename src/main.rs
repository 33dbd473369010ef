mod api;
mod cli;
mod commands;
mod credentials;
mod deploy;
mod error;
mod logging;
mod models;
mod prompt;
mod token;
mod validation;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.command.verbose());

    let result = match &cli.command {
        Commands::Auth {
            client_id,
            client_secret,
            force,
            ..
        } => commands::auth::run(client_id.as_deref(), client_secret.as_deref(), *force).await,
        Commands::Deploy { force, only, .. } => commands::deploy::run(*force, only.clone()).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
