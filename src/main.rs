#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::Parser;
use scriptgate::Config;
use scriptgate::app::dispatch::dispatch;
use scriptgate::cli::Cli;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::load_or_init()?;
    dispatch(cli, config).await
}
