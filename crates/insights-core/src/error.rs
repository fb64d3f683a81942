//! Error types shared by the pipeline crates.

use std::path::PathBuf;
use thiserror::Error;

use crate::schema::Column;

/// All errors produced by the sales insights pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The expected input file of a stage is absent.
    ///
    /// Callers report this as a diagnostic and end the run without output.
    #[error("Input file not found at {path}. {hint}")]
    MissingInput { path: PathBuf, hint: String },

    /// A column the stage cannot work without is absent from the header.
    #[error("Column '{column}' is missing from {path}")]
    MissingColumn { path: PathBuf, column: Column },

    /// A cleaned file carries a value that violates the cleaned-record shape.
    #[error("Malformed cleaned record at line {line}: column '{column}' has value {value:?}")]
    MalformedCleanRecord {
        line: u64,
        column: Column,
        value: String,
    },

    /// Grouping or summation could not be completed.
    #[error("Aggregation failed: {0}")]
    AggregationFailure(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be created, written or moved into place.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer rejected a record or header.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// `true` for the precondition failure that ends a run quietly.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, PipelineError::MissingInput { .. })
    }
}

/// Convenience alias used throughout the insights crates.
pub type Result<T> = std::result::Result<T, PipelineError>;
