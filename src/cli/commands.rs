use std::path::Path;

use crate::app::{AppContext, Result};
use crate::config::{Config, Overrides};
use crate::domain::SourceSpec;
use crate::pipeline::{Orchestrator, RunReport, SourceStatus};

/// Run every source in a configuration file.
///
/// Configuration errors are returned before anything is fetched. Failed
/// sources are reported but do not make the run fail.
pub async fn run_config(ctx: &AppContext, path: &Path, overrides: &Overrides) -> Result<RunReport> {
    let config = Config::load(path)?;
    println!(
        "Generating {} feeds from {}",
        config.sources.len(),
        path.display()
    );

    let orchestrator = Orchestrator::new(ctx.clone());
    let report = orchestrator.run(&config, overrides).await;
    print_report(&report);

    Ok(report)
}

/// Run the single source described by command-line flags.
pub async fn run_single(ctx: &AppContext, source: &SourceSpec, overrides: &Overrides) -> Result<()> {
    let orchestrator = Orchestrator::new(ctx.clone());
    let report = orchestrator.run_single(source, overrides).await?;

    println!(
        "Wrote {} items to {}{}",
        report.items,
        report.output_path.display(),
        if report.from_cache { " (cached listing)" } else { "" }
    );
    Ok(())
}

pub fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            SourceStatus::Succeeded(source) => println!(
                "  ok     {} → {} ({} items)",
                outcome.name,
                source.output_path.display(),
                source.items
            ),
            SourceStatus::Failed { during, error } => {
                eprintln!("  failed {} while {}: {}", outcome.name, during, error)
            }
        }
    }

    println!(
        "Done: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
}
