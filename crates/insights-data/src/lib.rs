//! Batch stages of the sales insights pipeline.
//!
//! Reads the raw export, cleans it, aggregates the cleaned records into
//! monthly metrics and prepares the chart datasets consumed by reporting.

pub mod aggregator;
pub mod cleaner;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod writer;

pub use insights_core as core;
