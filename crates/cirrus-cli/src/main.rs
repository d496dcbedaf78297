mod cli;
mod commands;
mod completions;
mod output;

use anyhow::Result;
use cirrus_core::AppConfig;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        completions::generate_completions(shell);
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;

    // Logs always go to a file so they never interleave with the chat
    let data_dir = config.ensure_data_dir()?;
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, "cirrus.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    tracing::debug!(data_dir = %data_dir.display(), "Cirrus starting");

    let format = cli.format;
    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run(&config).await,
        Commands::Ask { prompt } => commands::ask::run(&config, &prompt.join(" "), format).await,
        Commands::History => commands::history::run(&config, format).await,
        Commands::Guides { query } => commands::guides::run(query.as_deref(), format),
        Commands::Status => commands::status::run(&config, format),
        Commands::Completions { .. } => Ok(()),
    }
}
