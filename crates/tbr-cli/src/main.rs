//! terraform-bucket-registry - publish and serve Terraform providers from a bucket

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tbr_cli::cmd;
use tbr_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Publish(args) => cmd::publish::publish(args).await,
        Commands::Server(args) => cmd::server::serve(args.into()).await,
        Commands::Version => {
            cmd::version::version();
            Ok(())
        }
    }
}
