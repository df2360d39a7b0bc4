use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "linkfetcher")]
#[command(about = "Batch URL fetcher with HTML tag counts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
    /// Fetch URLs once and print the JSON results
    Fetch(FetchArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Configuration file (defaults to $LINKFETCHER_CONFIG or config/linkfetcher.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Configuration file (defaults to $LINKFETCHER_CONFIG or config/linkfetcher.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// URLs to fetch
    #[arg(required = true)]
    pub urls: Vec<String>,
}
