mod bootstrap;

use anyhow::Result;
use insights_core::error::PipelineError;
use insights_core::settings::{Command, Settings};
use insights_data::pipeline::{run_aggregate, run_all, run_clean};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Sales Insights v{} starting", env!("CARGO_PKG_VERSION"));

    let paths = settings.paths();
    let options = settings.report_options();
    tracing::debug!("Resolved paths: {:?}", paths);

    let result = match settings.command {
        Command::Clean => run_clean(&paths).map(|outcome| {
            println!("Cleaned data saved to {}", outcome.output.display());
        }),
        Command::Aggregate { skip_charts } => {
            run_aggregate(&paths, &options, !skip_charts).map(|outcome| {
                print_aggregate_summary(&outcome.output, !skip_charts, &paths.charts_dir);
            })
        }
        Command::Run { skip_charts } => {
            run_all(&paths, &options, !skip_charts).map(|(cleaned, aggregated)| {
                println!("Cleaned data saved to {}", cleaned.output.display());
                print_aggregate_summary(&aggregated.output, !skip_charts, &paths.charts_dir);
            })
        }
    };

    report_outcome(result)
}

/// Turn a stage result into the process result. A missing input ends the run
/// with a diagnostic on stdout and a success exit; other errors propagate.
fn report_outcome(result: std::result::Result<(), PipelineError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.is_missing_input() => {
            tracing::error!("{}", err);
            println!("{}", err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_aggregate_summary(output: &std::path::Path, charts: bool, charts_dir: &std::path::Path) {
    if charts {
        println!(
            "Aggregated data saved to {} and chart datasets saved to {}.",
            output.display(),
            charts_dir.display()
        );
    } else {
        println!("Aggregated data saved to {}.", output.display());
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
