//! Antelito - Document-grounded AI research assistant
//!
//! Main entry point for the Antelito application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use antelito::cli::{Cli, Commands};
use antelito::commands;
use antelito::config::Config;
use antelito::library::store;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // Mirror a CLI storage path into the environment so the store
    // initializer picks it up without threading it everywhere.
    if let Some(db_path) = &cli.storage_path {
        std::env::set_var(store::LIBRARY_DB_ENV, db_path);
        tracing::info!("Using library DB override from CLI: {}", db_path.display());
    }

    // Load and validate configuration
    let config = Config::load(&cli.config, &cli)?;
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat => {
            commands::chat::run_chat(config, &cli.role).await?;
            Ok(())
        }
        Commands::Library { command } => {
            let capability = commands::capability_for_cli(&cli.role, &config)?;
            commands::library::run_library(&config, command, capability).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("antelito=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
