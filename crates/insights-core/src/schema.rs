//! Declared column schema for sales tables.
//!
//! Every table carries the subset of [`Column`]s its header actually had, so
//! stages can skip optional columns explicitly instead of probing rows.

use std::fmt;

// ── Column ────────────────────────────────────────────────────────────────────

/// One column of the Raw Sales Record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Date,
    ProductId,
    ProductName,
    AtcCode,
    Region,
    RetailerId,
    UnitsSold,
    UnitPrice,
    SalesValue,
    PromotionFlag,
}

impl Column {
    /// All columns in canonical output order.
    pub const ALL: [Column; 10] = [
        Column::Date,
        Column::ProductId,
        Column::ProductName,
        Column::AtcCode,
        Column::Region,
        Column::RetailerId,
        Column::UnitsSold,
        Column::UnitPrice,
        Column::SalesValue,
        Column::PromotionFlag,
    ];

    /// Columns that must hold a value for a row to survive cleaning.
    pub const REQUIRED: [Column; 7] = [
        Column::Date,
        Column::ProductId,
        Column::Region,
        Column::RetailerId,
        Column::UnitsSold,
        Column::UnitPrice,
        Column::SalesValue,
    ];

    /// Text columns stripped of surrounding whitespace by the cleaner.
    pub const TEXT: [Column; 5] = [
        Column::ProductId,
        Column::ProductName,
        Column::AtcCode,
        Column::Region,
        Column::RetailerId,
    ];

    /// Header name exactly as it appears in the CSV files.
    pub fn name(self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::ProductId => "product_id",
            Column::ProductName => "product_name",
            Column::AtcCode => "atc_code",
            Column::Region => "region",
            Column::RetailerId => "retailer_id",
            Column::UnitsSold => "units_sold",
            Column::UnitPrice => "unit_price",
            Column::SalesValue => "sales_value",
            Column::PromotionFlag => "promotion_flag",
        }
    }

    /// Resolve a header name. Matching is exact after trimming.
    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim();
        Column::ALL.into_iter().find(|c| c.name() == header)
    }

    pub fn is_required(self) -> bool {
        Column::REQUIRED.contains(&self)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// The declared columns of one table, kept in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Build a schema from any collection of columns; duplicates collapse.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut columns: Vec<Column> = columns.into_iter().collect();
        columns.sort();
        columns.dedup();
        Self { columns }
    }

    /// A schema carrying all ten columns.
    pub fn full() -> Self {
        Self::new(Column::ALL)
    }

    pub fn contains(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// First required column this schema lacks, if any.
    pub fn missing_required(&self) -> Option<Column> {
        Column::ALL
            .into_iter()
            .find(|c| c.is_required() && !self.contains(*c))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
