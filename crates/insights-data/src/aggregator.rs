//! Monthly aggregation of cleaned sales records.
//!
//! Groups records by (month, product_id, product_name, atc_code, region) and
//! summarizes units, sales, mean unit price and promotion days per group.

use std::collections::BTreeMap;

use insights_core::error::{PipelineError, Result};
use insights_core::models::{CleanSalesRecord, CleanTable, GroupKey, MonthlyAggregate};
use insights_core::schema::Column;

// ── GroupStats ────────────────────────────────────────────────────────────────

/// Running sums for one group.
#[derive(Debug, Clone, Default)]
pub struct GroupStats {
    pub total_units: i64,
    pub total_sales: f64,
    pub unit_price_sum: f64,
    pub promo_days: u64,
    pub count: u64,
}

impl GroupStats {
    /// Add a single record to the running totals.
    pub fn add_record(&mut self, record: &CleanSalesRecord) -> Result<()> {
        self.total_units = self
            .total_units
            .checked_add(record.units_sold)
            .ok_or_else(|| {
                PipelineError::AggregationFailure(format!(
                    "total_units overflow for product '{}' in region '{}'",
                    record.product_id, record.region
                ))
            })?;
        self.total_sales += record.sales_value;
        self.unit_price_sum += record.unit_price;
        if record.promotion_flag == Some(true) {
            self.promo_days += 1;
        }
        self.count += 1;
        Ok(())
    }

    /// Arithmetic mean of the unit prices added so far.
    pub fn avg_unit_price(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.unit_price_sum / self.count as f64
        }
    }

    fn into_aggregate(self, key: GroupKey) -> Result<MonthlyAggregate> {
        let avg_unit_price = self.avg_unit_price();
        if !self.total_sales.is_finite() || !avg_unit_price.is_finite() {
            return Err(PipelineError::AggregationFailure(format!(
                "non-finite sums for product '{}' in {}",
                key.product_id, key.month
            )));
        }
        Ok(MonthlyAggregate {
            month: key.month,
            product_id: key.product_id,
            product_name: key.product_name,
            atc_code: key.atc_code,
            region: key.region,
            total_units: self.total_units,
            total_sales: self.total_sales,
            avg_unit_price,
            promo_days: self.promo_days,
        })
    }
}

// ── AggregateTotals ───────────────────────────────────────────────────────────

/// Totals across every aggregate row, used for run summaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTotals {
    pub groups: usize,
    pub total_units: i64,
    pub total_sales: f64,
    pub promo_days: u64,
}

// ── SalesAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that groups cleaned records by month.
pub struct SalesAggregator;

impl SalesAggregator {
    /// Columns the grouping and sums read besides the required ones.
    const GROUPING_COLUMNS: [Column; 3] =
        [Column::ProductName, Column::AtcCode, Column::PromotionFlag];

    /// Aggregate `table` into one row per distinct group key.
    ///
    /// Rows are sorted by key. The input is assumed to satisfy the cleaned
    /// record invariants and is not re-validated. Fails when the table's
    /// schema lacks a grouping column or a sum cannot be represented, in
    /// which case no partial result is returned.
    pub fn aggregate(table: &CleanTable) -> Result<Vec<MonthlyAggregate>> {
        if let Some(column) = Self::GROUPING_COLUMNS
            .into_iter()
            .find(|c| !table.schema.contains(*c))
        {
            return Err(PipelineError::AggregationFailure(format!(
                "cleaned data has no '{}' column",
                column
            )));
        }

        Self::aggregate_records(&table.records)
    }

    /// Group `records` without a schema check.
    pub fn aggregate_records(records: &[CleanSalesRecord]) -> Result<Vec<MonthlyAggregate>> {
        // BTreeMap keeps the output sorted by key.
        let mut groups: BTreeMap<GroupKey, GroupStats> = BTreeMap::new();

        for record in records {
            groups
                .entry(record.group_key())
                .or_default()
                .add_record(record)?;
        }

        groups
            .into_iter()
            .map(|(key, stats)| stats.into_aggregate(key))
            .collect()
    }

    /// Sum up every aggregate row into a single [`AggregateTotals`].
    pub fn calculate_totals(rows: &[MonthlyAggregate]) -> AggregateTotals {
        let mut totals = AggregateTotals::default();
        for row in rows {
            totals.groups += 1;
            totals.total_units = totals.total_units.saturating_add(row.total_units);
            totals.total_sales += row.total_sales;
            totals.promo_days += row.promo_days;
        }
        totals
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
