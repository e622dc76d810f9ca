use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::relay_events;
use tokio::io::BufReader;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod presenter;

use commands::{App, Command};
use config::{load_settings, DEFAULT_CONFIG_PATH};
use presenter::TerminalPresenter;

#[derive(Parser, Debug)]
#[command(name = "quotes", about = "Quote collection with optional server sync")]
struct Args {
    /// Settings file; a missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(database_url) = args.database_url {
        settings.database_url = config::normalize_database_url(&database_url);
    }
    if let Some(server_url) = args.server_url {
        settings.server_url = Some(server_url);
    }

    let app = App::connect(&settings, Arc::new(TerminalPresenter::stdout())).await?;
    let relay = tokio::spawn(relay_events(app.subscribe_events(), app.presenter()));

    let result = match args.command {
        Command::Repl => app.repl(BufReader::new(tokio::io::stdin())).await,
        command => app.execute(command).await,
    };

    // Closing the event channel lets the relay print what is still queued.
    drop(app);
    if let Err(err) = relay.await {
        warn!(error = %err, "app: event relay ended abnormally");
    }
    result
}
