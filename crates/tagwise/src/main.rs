mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Version => commands::version::run(),
        Commands::Curate {
            stats,
            text,
            max_tags,
            budget,
        } => commands::curate::run(config, &stats, &text, max_tags, budget),
        Commands::Prompt { todo } => commands::prompt::run(config, &todo),
        Commands::Classify { message } => commands::classify::run(&message),
        Commands::Backoff {
            kind,
            attempts,
            retry_after,
        } => commands::backoff::run(kind, attempts, retry_after),
        Commands::Analyze {
            todo,
            metadata,
            user,
            todo_id,
        } => {
            commands::analyze::run(
                config,
                &todo,
                metadata.as_deref(),
                user.as_deref(),
                todo_id.as_deref(),
            )
            .await
        }
        Commands::Chat { user } => commands::chat::run(config, &user).await,
        Commands::Calls { stats, limit } => commands::calls::run(config, stats, limit),
    }
}
