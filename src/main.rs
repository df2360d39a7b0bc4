mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use linkfetcher::config::Config;
use linkfetcher::engine::Engine;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    // Logs go to stderr so `fetch` output on stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => {
            let config = load_config(args.config)?;
            linkfetcher::api::run(config, args.address).await?;
        }
        Commands::Fetch(args) => {
            let config = load_config(args.config)?;
            let engine = Engine::new(config.engine.to_engine_config())?;
            let results = engine.run_batch(args.urls).await;
            engine.stop().await;
            println!("{}", serde_json::to_string_pretty(&results?)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config, AnyError> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}
