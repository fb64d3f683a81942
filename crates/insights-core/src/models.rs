//! Record and table types flowing between the pipeline stages.

use chrono::NaiveDate;
use serde::Serialize;

use crate::month::MonthKey;
use crate::schema::{Column, Schema};

/// One row of the raw sales export, before any validation.
///
/// Every field is optional: a cell that is empty, a missing-value token or
/// not parseable as its column's type is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSalesRecord {
    pub date: Option<NaiveDate>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub atc_code: Option<String>,
    pub region: Option<String>,
    pub retailer_id: Option<String>,
    pub units_sold: Option<i64>,
    pub unit_price: Option<f64>,
    pub sales_value: Option<f64>,
    pub promotion_flag: Option<bool>,
}

/// A raw record that passed validation and normalization.
///
/// The required fields are no longer optional. `units_sold > 0`,
/// `unit_price >= 0` and `sales_value >= 0` hold, and the text fields carry
/// no surrounding whitespace.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanSalesRecord {
    pub date: NaiveDate,
    pub product_id: String,
    pub product_name: Option<String>,
    pub atc_code: Option<String>,
    pub region: String,
    pub retailer_id: String,
    pub units_sold: i64,
    pub unit_price: f64,
    pub sales_value: f64,
    pub promotion_flag: Option<bool>,
}

impl CleanSalesRecord {
    /// Mutable access to a text column's value, `None` for non-text columns
    /// and absent optional values.
    pub fn text_mut(&mut self, column: Column) -> Option<&mut String> {
        match column {
            Column::ProductId => Some(&mut self.product_id),
            Column::ProductName => self.product_name.as_mut(),
            Column::AtcCode => self.atc_code.as_mut(),
            Column::Region => Some(&mut self.region),
            Column::RetailerId => Some(&mut self.retailer_id),
            _ => None,
        }
    }

    /// The CSV cell for `column`. Absent values render as an empty cell.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Date => self.date.format("%Y-%m-%d").to_string(),
            Column::ProductId => self.product_id.clone(),
            Column::ProductName => self.product_name.clone().unwrap_or_default(),
            Column::AtcCode => self.atc_code.clone().unwrap_or_default(),
            Column::Region => self.region.clone(),
            Column::RetailerId => self.retailer_id.clone(),
            Column::UnitsSold => self.units_sold.to_string(),
            Column::UnitPrice => self.unit_price.to_string(),
            Column::SalesValue => self.sales_value.to_string(),
            Column::PromotionFlag => match self.promotion_flag {
                Some(true) => "1".to_string(),
                Some(false) => "0".to_string(),
                None => String::new(),
            },
        }
    }

    /// The key of the monthly group this record belongs to.
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            month: MonthKey::of(self.date),
            product_id: self.product_id.clone(),
            product_name: self.product_name.clone(),
            atc_code: self.atc_code.clone(),
            region: self.region.clone(),
        }
    }
}

/// The raw export held in memory together with its declared schema.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub schema: Schema,
    pub records: Vec<RawSalesRecord>,
}

/// The cleaned record set together with its declared schema.
#[derive(Debug, Clone, Default)]
pub struct CleanTable {
    pub schema: Schema,
    pub records: Vec<CleanSalesRecord>,
}

impl CleanTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Identity of one monthly aggregate row.
///
/// Ordered field by field, so a sorted map of keys is ordered by month first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub month: MonthKey,
    pub product_id: String,
    pub product_name: Option<String>,
    pub atc_code: Option<String>,
    pub region: String,
}

/// Monthly summary of one (month, product, category, region) group.
///
/// Field order is the column order of the aggregated CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub month: MonthKey,
    pub product_id: String,
    pub product_name: Option<String>,
    pub atc_code: Option<String>,
    pub region: String,
    pub total_units: i64,
    pub total_sales: f64,
    pub avg_unit_price: f64,
    pub promo_days: u64,
}

impl MonthlyAggregate {
    /// Header of the aggregated CSV.
    pub const COLUMNS: [&'static str; 9] = [
        "month",
        "product_id",
        "product_name",
        "atc_code",
        "region",
        "total_units",
        "total_sales",
        "avg_unit_price",
        "promo_days",
    ];
}
