use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use moltpulse::app::AppContext;
use moltpulse::cli::{commands, Cli, Commands};
use moltpulse::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moltpulse=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Mock = cli.command {
        commands::print_mock()?;
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config).await?;

    match cli.command {
        Commands::Serve {
            port,
            crawl_every,
            crawl_now,
        } => {
            commands::serve(ctx, port, crawl_every, crawl_now).await?;
        }
        Commands::Crawl { save } => {
            commands::crawl(&ctx, save).await?;
        }
        // Handled before loading config
        Commands::Mock => {}
    }

    Ok(())
}
