//! taskcache entry point.

use anyhow::Result;
use clap::Parser;

use taskcache::cli::{commands, handle_error, Cli, Commands};
use taskcache::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(&err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    let _logger = LoggerImpl::init(&config.logging)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::Migrate(args) => commands::migrate::execute(args, config, cli.json).await,
    }
}
