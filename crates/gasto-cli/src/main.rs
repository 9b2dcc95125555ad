//! Gasto Recorrente CLI entry point

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes priority, then --verbose, then the info default
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    match cli.command {
        Commands::Analyze { file, json } => commands::cmd_analyze(&file, json).await,
        Commands::Providers => commands::cmd_providers().await,
        Commands::Demo { json } => commands::cmd_demo(json),
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&host, port, static_dir.as_deref()).await,
    }
}
