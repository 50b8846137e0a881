//! respromote - `RuleApp` promotion CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use respromote_cli::cmd;
use respromote_cli::{Cli, Commands};
use respromote_core::PromoteConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("respromote=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replicate(args) => {
            let mut config = PromoteConfig::load(&cli.config).await?;
            config.apply_process_env()?;
            cmd::replicate::replicate(config, args, cli.quiet).await
        }
        Commands::Clean { stage_dir } => cmd::clean::clean(&cli.config, stage_dir, cli.quiet).await,
    }
}
