//! Domain types shared by the sales insights crates.
//!
//! Holds the record shapes, the declared column schema, cell parsers, month
//! derivation, the error taxonomy and the command-line settings.

pub mod data_processors;
pub mod error;
pub mod models;
pub mod month;
pub mod schema;
pub mod settings;

pub use error::{PipelineError, Result};
