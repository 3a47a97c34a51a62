use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trendfeed::app::AppContext;
use trendfeed::cli::{commands, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new().context("Failed to set up HTTP client")?;
    let overrides = cli.overrides();

    match &cli.config {
        Some(path) => {
            commands::run_config(&ctx, path, &overrides)
                .await
                .with_context(|| format!("Failed to run sources from {}", path.display()))?;
        }
        None => {
            let source = cli.single_source();
            commands::run_single(&ctx, &source, &overrides)
                .await
                .with_context(|| format!("Failed to generate feed {}", source.name))?;
        }
    }

    Ok(())
}
