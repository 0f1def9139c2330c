mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, ConfigCommand};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run(args).await?,
        Commands::Upload(args) => commands::upload(args).await?,
        Commands::Whoami(args) => commands::whoami(args).await?,
        Commands::Config(ConfigCommand::Show) => commands::config_show()?,
        Commands::Config(ConfigCommand::Set(args)) => commands::config_set(args)?,
    }

    Ok(())
}
