//! Validation and normalization of raw sales records.

use insights_core::data_processors::is_missing_value;
use insights_core::models::{CleanSalesRecord, CleanTable, RawSalesRecord, RawTable};
use insights_core::schema::{Column, Schema};

// ── CleanReport ───────────────────────────────────────────────────────────────

/// How many rows each cleaning step let through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_read: usize,
    /// Rows missing at least one required field.
    pub dropped_missing: usize,
    /// Rows with complete fields but non-positive units or negative amounts.
    pub dropped_out_of_range: usize,
    pub rows_kept: usize,
}

/// Output of [`Cleaner::clean`].
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub table: CleanTable,
    pub report: CleanReport,
}

// ── Cleaner ───────────────────────────────────────────────────────────────────

/// Stateless helper that turns a raw table into a cleaned one.
pub struct Cleaner;

impl Cleaner {
    /// Clean `raw` in three steps:
    ///
    /// 1. drop rows missing any required field,
    /// 2. keep rows with `units_sold > 0`, `unit_price >= 0`, `sales_value >= 0`,
    /// 3. strip surrounding whitespace from the text columns the schema declares.
    ///
    /// Surviving rows keep their input order. Dropped rows are only counted.
    pub fn clean(raw: &RawTable) -> CleanOutcome {
        let mut report = CleanReport {
            rows_read: raw.records.len(),
            ..Default::default()
        };

        let records: Vec<CleanSalesRecord> = raw
            .records
            .iter()
            .filter_map(|record| {
                let Some(complete) = Self::require_fields(record) else {
                    report.dropped_missing += 1;
                    return None;
                };
                if !Self::in_range(&complete) {
                    report.dropped_out_of_range += 1;
                    return None;
                }
                Some(Self::normalize(complete, &raw.schema))
            })
            .collect();

        report.rows_kept = records.len();

        CleanOutcome {
            table: CleanTable {
                schema: raw.schema.clone(),
                records,
            },
            report,
        }
    }

    /// Step 1: promote a raw record once all required fields are present.
    fn require_fields(record: &RawSalesRecord) -> Option<CleanSalesRecord> {
        Some(CleanSalesRecord {
            date: record.date?,
            product_id: record.product_id.clone()?,
            product_name: record.product_name.clone(),
            atc_code: record.atc_code.clone(),
            region: record.region.clone()?,
            retailer_id: record.retailer_id.clone()?,
            units_sold: record.units_sold?,
            unit_price: record.unit_price?,
            sales_value: record.sales_value?,
            promotion_flag: record.promotion_flag,
        })
    }

    /// Step 2: the numeric range rules.
    fn in_range(record: &CleanSalesRecord) -> bool {
        record.units_sold > 0 && record.unit_price >= 0.0 && record.sales_value >= 0.0
    }

    /// Step 3: strip the text columns declared by `schema`.
    ///
    /// An optional text value that strips down to a blank or a missing-value
    /// token (`" None "`) becomes absent, the same value it reads back as
    /// from the cleaned file.
    fn normalize(mut record: CleanSalesRecord, schema: &Schema) -> CleanSalesRecord {
        for column in Column::TEXT {
            if !schema.contains(column) {
                continue;
            }
            if let Some(value) = record.text_mut(column) {
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_string();
                }
            }
        }

        if record.product_name.as_deref().is_some_and(is_missing_value) {
            record.product_name = None;
        }
        if record.atc_code.as_deref().is_some_and(is_missing_value) {
            record.atc_code = None;
        }
        record
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
