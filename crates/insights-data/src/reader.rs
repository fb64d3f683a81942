//! CSV loading for the raw export and the cleaned sales file.
//!
//! The raw loader is tolerant: cells that are missing or do not parse become
//! `None` and are judged later by the cleaner. The cleaned loader is strict,
//! since a defect there means the previous stage's output was tampered with.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use insights_core::data_processors::{
    is_missing_value, parse_text, DateParser, FlagParser, NumberParser,
};
use insights_core::error::{PipelineError, Result};
use insights_core::models::{CleanSalesRecord, CleanTable, RawSalesRecord, RawTable};
use insights_core::schema::{Column, Schema};
use tracing::{debug, info};

// ── ColumnLayout ──────────────────────────────────────────────────────────────

/// Position of every declared column in a file's header.
#[derive(Debug, Clone, Default)]
struct ColumnLayout {
    positions: Vec<(Column, usize)>,
}

impl ColumnLayout {
    /// Map header names to columns. Unknown names are skipped; for duplicated
    /// names the first occurrence wins.
    fn from_headers(headers: &StringRecord, path: &Path) -> Self {
        let mut positions: Vec<(Column, usize)> = Vec::new();
        for (index, name) in headers.iter().enumerate() {
            match Column::from_header(name) {
                Some(column) if !positions.iter().any(|(c, _)| *c == column) => {
                    positions.push((column, index));
                }
                Some(column) => {
                    debug!("{}: duplicate column '{}' ignored", path.display(), column);
                }
                None => {
                    debug!("{}: undeclared column '{}' ignored", path.display(), name);
                }
            }
        }
        Self { positions }
    }

    fn schema(&self) -> Schema {
        Schema::new(self.positions.iter().map(|(c, _)| *c))
    }

    /// The cell for `column`, `None` when the column is undeclared or the
    /// row is too short to reach it.
    fn cell<'r>(&self, record: &'r StringRecord, column: Column) -> Option<&'r str> {
        let (_, index) = self.positions.iter().find(|(c, _)| *c == column)?;
        record.get(*index)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the raw sales export at `path`.
///
/// Fails when the file cannot be opened, is not valid CSV, or its header
/// lacks one of the required columns.
pub fn load_raw_records(path: &Path) -> Result<RawTable> {
    let mut reader = open_reader(path)?;
    let layout = ColumnLayout::from_headers(reader.headers()?, path);
    let schema = layout.schema();
    if let Some(column) = schema.missing_required() {
        return Err(PipelineError::MissingColumn {
            path: path.to_path_buf(),
            column,
        });
    }

    let mut records: Vec<RawSalesRecord> = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(parse_raw_record(&record, &layout));
    }

    info!("Read {} raw records from {}", records.len(), path.display());
    Ok(RawTable { schema, records })
}

/// Load a cleaned sales file written by the cleaning stage.
///
/// Every required cell must hold a valid value; a violation is reported as
/// [`PipelineError::MalformedCleanRecord`].
pub fn load_clean_records(path: &Path) -> Result<CleanTable> {
    let mut reader = open_reader(path)?;
    let layout = ColumnLayout::from_headers(reader.headers()?, path);
    let schema = layout.schema();
    if let Some(column) = schema.missing_required() {
        return Err(PipelineError::MissingColumn {
            path: path.to_path_buf(),
            column,
        });
    }

    let mut records: Vec<CleanSalesRecord> = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        records.push(parse_clean_record(&record, &layout, line)?);
    }

    info!(
        "Read {} cleaned records from {}",
        records.len(),
        path.display()
    );
    Ok(CleanTable { schema, records })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

fn parse_raw_record(record: &StringRecord, layout: &ColumnLayout) -> RawSalesRecord {
    let text = |column| layout.cell(record, column).and_then(parse_text);
    RawSalesRecord {
        date: layout.cell(record, Column::Date).and_then(DateParser::parse),
        product_id: text(Column::ProductId),
        product_name: text(Column::ProductName),
        atc_code: text(Column::AtcCode),
        region: text(Column::Region),
        retailer_id: text(Column::RetailerId),
        units_sold: layout
            .cell(record, Column::UnitsSold)
            .and_then(NumberParser::parse_units),
        unit_price: layout
            .cell(record, Column::UnitPrice)
            .and_then(NumberParser::parse_amount),
        sales_value: layout
            .cell(record, Column::SalesValue)
            .and_then(NumberParser::parse_amount),
        promotion_flag: layout
            .cell(record, Column::PromotionFlag)
            .and_then(FlagParser::parse),
    }
}

fn parse_clean_record(
    record: &StringRecord,
    layout: &ColumnLayout,
    line: u64,
) -> Result<CleanSalesRecord> {
    let malformed = |column: Column, value: &str| PipelineError::MalformedCleanRecord {
        line,
        column,
        value: value.to_string(),
    };

    // Required text was stripped by the cleaner; a blank value is legitimate.
    let required_text = |column: Column| -> Result<String> {
        layout
            .cell(record, column)
            .map(str::to_string)
            .ok_or_else(|| malformed(column, ""))
    };

    fn required<T>(
        cell: Option<&str>,
        parse: impl Fn(&str) -> Option<T>,
    ) -> std::result::Result<T, String> {
        let raw = cell.unwrap_or("");
        parse(raw).ok_or_else(|| raw.to_string())
    }

    fn optional<T>(
        cell: Option<&str>,
        parse: impl Fn(&str) -> Option<T>,
    ) -> std::result::Result<Option<T>, String> {
        match cell {
            None => Ok(None),
            Some(raw) if is_missing_value(raw) => Ok(None),
            Some(raw) => parse(raw).map(Some).ok_or_else(|| raw.to_string()),
        }
    }

    let cell = |column| layout.cell(record, column);

    Ok(CleanSalesRecord {
        date: required(cell(Column::Date), DateParser::parse)
            .map_err(|v| malformed(Column::Date, &v))?,
        product_id: required_text(Column::ProductId)?,
        product_name: cell(Column::ProductName).and_then(parse_text),
        atc_code: cell(Column::AtcCode).and_then(parse_text),
        region: required_text(Column::Region)?,
        retailer_id: required_text(Column::RetailerId)?,
        units_sold: required(cell(Column::UnitsSold), NumberParser::parse_units)
            .map_err(|v| malformed(Column::UnitsSold, &v))?,
        unit_price: required(cell(Column::UnitPrice), NumberParser::parse_amount)
            .map_err(|v| malformed(Column::UnitPrice, &v))?,
        sales_value: required(cell(Column::SalesValue), NumberParser::parse_amount)
            .map_err(|v| malformed(Column::SalesValue, &v))?,
        promotion_flag: optional(cell(Column::PromotionFlag), FlagParser::parse)
            .map_err(|v| malformed(Column::PromotionFlag, &v))?,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const HEADER: &str = "date,product_id,product_name,atc_code,region,retailer_id,units_sold,unit_price,sales_value,promotion_flag";

    // ── load_raw_records ──────────────────────────────────────────────────────

    #[test]
    fn test_load_raw_records_basic() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "raw.csv",
            &format!("{HEADER}\n2024-01-05,A ,Aspirin,N02BA01,X,R1,10,5.0,50.0,1\n"),
        );

        let table = load_raw_records(&path).unwrap();
        assert_eq!(table.schema, Schema::full());
        assert_eq!(table.records.len(), 1);

        let record = &table.records[0];
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(record.product_id.as_deref(), Some("A "));
        assert_eq!(record.units_sold, Some(10));
        assert_eq!(record.unit_price, Some(5.0));
        assert_eq!(record.promotion_flag, Some(true));
    }

    #[test]
    fn test_load_raw_records_missing_and_malformed_cells_are_none() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "raw.csv",
            &format!("{HEADER}\nnot-a-date,,Aspirin,NA,X,R1,ten,5.0,NaN,\n"),
        );

        let table = load_raw_records(&path).unwrap();
        let record = &table.records[0];
        assert!(record.date.is_none());
        assert!(record.product_id.is_none());
        assert!(record.atc_code.is_none());
        assert!(record.units_sold.is_none());
        assert!(record.sales_value.is_none());
        assert!(record.promotion_flag.is_none());
        assert_eq!(record.product_name.as_deref(), Some("Aspirin"));
    }

    #[test]
    fn test_load_raw_records_short_rows_read_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "raw.csv", &format!("{HEADER}\n2024-01-05,A,Aspirin\n"));

        let table = load_raw_records(&path).unwrap();
        assert_eq!(table.records.len(), 1);
        assert!(table.records[0].region.is_none());
        assert!(table.records[0].sales_value.is_none());
    }

    #[test]
    fn test_load_raw_records_optional_columns_absent() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "raw.csv",
            "retailer_id,date,product_id,region,units_sold,unit_price,sales_value,notes\n\
             R1,2024-01-05,A,X,10,5.0,50.0,ignored\n",
        );

        let table = load_raw_records(&path).unwrap();
        assert!(!table.schema.contains(Column::ProductName));
        assert!(!table.schema.contains(Column::PromotionFlag));
        assert_eq!(table.records[0].retailer_id.as_deref(), Some("R1"));
        assert!(table.records[0].product_name.is_none());
    }

    #[test]
    fn test_load_raw_records_missing_required_column() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "raw.csv",
            "date,product_id,region,retailer_id,units_sold,unit_price\n",
        );

        let err = load_raw_records(&path).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingColumn {
                column: Column::SalesValue,
                ..
            }
        ));
    }

    #[test]
    fn test_load_raw_records_empty_file_with_header() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "raw.csv", &format!("{HEADER}\n"));

        let table = load_raw_records(&path).unwrap();
        assert!(table.records.is_empty());
    }

    #[test]
    fn test_load_raw_records_nonexistent_path() {
        let err = load_raw_records(Path::new("/tmp/does-not-exist-sales-test-xyz.csv"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileRead { .. }));
    }

    // ── load_clean_records ────────────────────────────────────────────────────

    #[test]
    fn test_load_clean_records_basic() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "clean.csv",
            &format!("{HEADER}\n2024-01-05,A,,N02BA01,X,R1,10,5,50,\n"),
        );

        let table = load_clean_records(&path).unwrap();
        let record = &table.records[0];
        assert_eq!(record.product_id, "A");
        assert!(record.product_name.is_none());
        assert_eq!(record.atc_code.as_deref(), Some("N02BA01"));
        assert_eq!(record.units_sold, 10);
        assert_eq!(record.sales_value, 50.0);
        assert!(record.promotion_flag.is_none());
    }

    #[test]
    fn test_load_clean_records_rejects_non_numeric() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "clean.csv",
            &format!("{HEADER}\n2024-01-05,A,Aspirin,N02BA01,X,R1,10,5,abc,0\n"),
        );

        let err = load_clean_records(&path).unwrap_err();
        match err {
            PipelineError::MalformedCleanRecord {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 2);
                assert_eq!(column, Column::SalesValue);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_clean_records_rejects_bad_flag() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "clean.csv",
            &format!("{HEADER}\n2024-01-05,A,Aspirin,N02BA01,X,R1,10,5,50,maybe\n"),
        );

        let err = load_clean_records(&path).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedCleanRecord {
                column: Column::PromotionFlag,
                ..
            }
        ));
    }
}
