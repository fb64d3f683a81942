//! Output files of the pipeline stages.
//!
//! Every file is written to a temporary sibling and renamed into place, so an
//! interrupted or failed write leaves the previous output (or nothing) behind.

use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use insights_core::error::{PipelineError, Result};
use insights_core::models::{CleanTable, MonthlyAggregate};
use tracing::debug;

// ── Public API ────────────────────────────────────────────────────────────────

/// Write the cleaned table: the columns its schema declares, in canonical
/// order, no index column.
pub fn write_clean_records(path: &Path, table: &CleanTable) -> Result<()> {
    write_atomically(path, |file| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let columns = table.schema.columns();
        writer.write_record(columns.iter().map(|c| c.name()))?;
        for record in &table.records {
            writer.write_record(columns.iter().map(|c| record.cell(*c)))?;
        }
        writer.flush()?;
        Ok(())
    })?;

    debug!(
        "Wrote {} cleaned records to {}",
        table.records.len(),
        path.display()
    );
    Ok(())
}

/// Write the monthly aggregate table. The header is written even when there
/// are no rows.
pub fn write_aggregates(path: &Path, rows: &[MonthlyAggregate]) -> Result<()> {
    write_atomically(path, |file| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record(MonthlyAggregate::COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    })?;

    debug!("Wrote {} aggregate rows to {}", rows.len(), path.display());
    Ok(())
}

/// Create `path`'s parent directory if absent, run `write` against a
/// temporary sibling file and move it over `path` once `write` succeeds.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let io_err = |source: std::io::Error| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = temp_sibling(path);
    let mut file = File::create(&tmp).map_err(io_err)?;

    let written = write(&mut file).and_then(|()| file.flush().map_err(io_err));
    drop(file);

    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    std::fs::rename(&tmp, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        io_err(source)
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
