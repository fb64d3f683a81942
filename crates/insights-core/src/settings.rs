//! Command-line settings and the resolved pipeline configuration.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Clean pharmaceutical sales exports and build monthly sales metrics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sales-insights",
    about = "Clean pharmaceutical sales exports and build monthly sales metrics",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Project root the default data locations are resolved against
    #[arg(long, global = true, env = "SALES_BASE_DIR", default_value = ".")]
    pub base_dir: PathBuf,

    /// Raw sales export [default: <base-dir>/data/raw/pharma_sales.csv]
    #[arg(long, global = true, env = "SALES_RAW_PATH")]
    pub raw_path: Option<PathBuf>,

    /// Cleaned sales file [default: <base-dir>/data/processed/sales_clean.csv]
    #[arg(long, global = true, env = "SALES_CLEAN_PATH")]
    pub clean_path: Option<PathBuf>,

    /// Monthly aggregate file [default: <base-dir>/data/processed/sales_tableau.csv]
    #[arg(long, global = true, env = "SALES_AGGREGATE_PATH")]
    pub aggregate_path: Option<PathBuf>,

    /// Directory for chart datasets [default: <base-dir>/imgs]
    #[arg(long, global = true, env = "SALES_CHARTS_DIR")]
    pub charts_dir: Option<PathBuf>,

    /// Number of products kept in the top-products chart
    #[arg(long, global = true, default_value = "20", value_parser = clap::value_parser!(u32).range(1..))]
    pub top_n: u32,

    /// Maximum number of cleaned rows in the price-vs-demand sample
    #[arg(long, global = true, default_value = "40000")]
    pub sample_cap: usize,

    /// Seed of the price-vs-demand sampler
    #[arg(long, global = true, default_value = "42")]
    pub sample_seed: u64,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// The invocable pipeline actions.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Validate and normalize the raw export into the cleaned sales file
    Clean,
    /// Aggregate the cleaned sales file into monthly metrics
    Aggregate {
        /// Do not write the chart datasets
        #[arg(long)]
        skip_charts: bool,
    },
    /// Clean, then aggregate
    Run {
        /// Do not write the chart datasets
        #[arg(long)]
        skip_charts: bool,
    },
}

// ── Resolved configuration ─────────────────────────────────────────────────────

/// Input and output locations of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub raw: PathBuf,
    pub clean: PathBuf,
    pub aggregate: PathBuf,
    pub charts_dir: PathBuf,
}

impl PipelinePaths {
    /// The conventional project layout rooted at `base_dir`.
    pub fn under(base_dir: &Path) -> Self {
        let processed = base_dir.join("data").join("processed");
        Self {
            raw: base_dir.join("data").join("raw").join("pharma_sales.csv"),
            clean: processed.join("sales_clean.csv"),
            aggregate: processed.join("sales_tableau.csv"),
            charts_dir: base_dir.join("imgs"),
        }
    }

    /// Reject layouts where one stage would overwrite another stage's input.
    pub fn validate(&self) -> Result<()> {
        if self.clean == self.raw {
            return Err(PipelineError::Config(format!(
                "cleaned output {} would overwrite the raw input",
                self.clean.display()
            )));
        }
        if self.aggregate == self.raw || self.aggregate == self.clean {
            return Err(PipelineError::Config(format!(
                "aggregate output {} would overwrite a pipeline input",
                self.aggregate.display()
            )));
        }
        Ok(())
    }
}

/// Knobs of the chart dataset builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub sample_cap: usize,
    pub sample_seed: u64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: 20,
            sample_cap: 40_000,
            sample_seed: 42,
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Resolve explicit overrides against the layout under `base_dir`.
    pub fn paths(&self) -> PipelinePaths {
        let defaults = PipelinePaths::under(&self.base_dir);
        PipelinePaths {
            raw: self.raw_path.clone().unwrap_or(defaults.raw),
            clean: self.clean_path.clone().unwrap_or(defaults.clean),
            aggregate: self.aggregate_path.clone().unwrap_or(defaults.aggregate),
            charts_dir: self.charts_dir.clone().unwrap_or(defaults.charts_dir),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            top_n: self.top_n as usize,
            sample_cap: self.sample_cap,
            sample_seed: self.sample_seed,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
