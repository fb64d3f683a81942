//! Chart datasets for the reporting collaborator.
//!
//! Rendering happens elsewhere. This module derives the five fixed series the
//! charts plot and writes each one as a small CSV next to a `charts.json`
//! manifest carrying titles and axis labels.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use insights_core::error::Result;
use insights_core::models::{CleanSalesRecord, MonthlyAggregate};
use insights_core::month::MonthKey;
use insights_core::settings::ReportOptions;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use crate::writer::write_atomically;

// ── ChartKind ─────────────────────────────────────────────────────────────────

/// The fixed set of exploratory charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    MonthlySalesTrend,
    TopProducts,
    AtcBreakdown,
    SeasonalityCurve,
    PriceVsDemand,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::MonthlySalesTrend,
        ChartKind::TopProducts,
        ChartKind::AtcBreakdown,
        ChartKind::SeasonalityCurve,
        ChartKind::PriceVsDemand,
    ];

    pub fn file_stem(self) -> &'static str {
        match self {
            ChartKind::MonthlySalesTrend => "monthly_sales_trend",
            ChartKind::TopProducts => "top_products",
            ChartKind::AtcBreakdown => "atc_breakdown",
            ChartKind::SeasonalityCurve => "seasonality_curve",
            ChartKind::PriceVsDemand => "price_vs_demand",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::MonthlySalesTrend => "Monthly Total Sales",
            ChartKind::TopProducts => "Top Products by Total Sales",
            ChartKind::AtcBreakdown => "Sales by ATC Category",
            ChartKind::SeasonalityCurve => "Seasonality: Average Monthly Sales",
            ChartKind::PriceVsDemand => "Price vs Demand (Sample)",
        }
    }

    /// `(x, y)` axis labels.
    pub fn axis_labels(self) -> (&'static str, &'static str) {
        match self {
            ChartKind::MonthlySalesTrend => ("Month", "Total Sales"),
            ChartKind::TopProducts => ("Product Name", "Total Sales"),
            ChartKind::AtcBreakdown => ("ATC Code", "Total Sales"),
            ChartKind::SeasonalityCurve => ("Month", "Average Sales"),
            ChartKind::PriceVsDemand => ("Unit Price", "Units Sold"),
        }
    }

    /// Header of the dataset CSV.
    pub fn columns(self) -> [&'static str; 2] {
        match self {
            ChartKind::MonthlySalesTrend => ["month", "total_sales"],
            ChartKind::TopProducts => ["product_name", "total_sales"],
            ChartKind::AtcBreakdown => ["atc_code", "total_sales"],
            ChartKind::SeasonalityCurve => ["month_num", "avg_total_sales"],
            ChartKind::PriceVsDemand => ["unit_price", "units_sold"],
        }
    }
}

// ── Chart ─────────────────────────────────────────────────────────────────────

/// One chart's data, ready to be plotted.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    /// Label → value pairs, in plotting order.
    Categorical(Vec<(String, f64)>),
    /// `(unit_price, units_sold)` points.
    Scatter(Vec<(f64, i64)>),
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::Categorical(points) => points.len(),
            Series::Scatter(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub kind: ChartKind,
    pub series: Series,
}

/// Manifest entry describing one written dataset.
#[derive(Debug, Clone, Serialize)]
struct ManifestEntry {
    chart: ChartKind,
    file: String,
    title: &'static str,
    x_label: &'static str,
    y_label: &'static str,
    points: usize,
}

// ── Series builders ───────────────────────────────────────────────────────────

/// Total sales per month, oldest month first.
pub fn monthly_sales_trend(rows: &[MonthlyAggregate]) -> Chart {
    let mut by_month: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for row in rows {
        *by_month.entry(row.month).or_default() += row.total_sales;
    }

    Chart {
        kind: ChartKind::MonthlySalesTrend,
        series: Series::Categorical(
            by_month
                .into_iter()
                .map(|(month, total)| (month.to_string(), total))
                .collect(),
        ),
    }
}

/// The `top_n` product names with the highest total sales, highest first.
/// Rows without a product name are not ranked.
pub fn top_products(rows: &[MonthlyAggregate], top_n: usize) -> Chart {
    let mut ranked = ranked_totals(rows.iter().map(|r| (r.product_name.as_deref(), r.total_sales)));
    ranked.truncate(top_n);

    Chart {
        kind: ChartKind::TopProducts,
        series: Series::Categorical(ranked),
    }
}

/// Total sales per ATC code, highest first. Rows without a code are skipped.
pub fn atc_breakdown(rows: &[MonthlyAggregate]) -> Chart {
    Chart {
        kind: ChartKind::AtcBreakdown,
        series: Series::Categorical(ranked_totals(
            rows.iter().map(|r| (r.atc_code.as_deref(), r.total_sales)),
        )),
    }
}

/// Mean aggregate-row sales per calendar month number, January first.
/// Months with no rows are left out.
pub fn seasonality_curve(rows: &[MonthlyAggregate]) -> Chart {
    let mut by_month: BTreeMap<u32, (f64, u64)> = BTreeMap::new();
    for row in rows {
        let slot = by_month.entry(row.month.month_number()).or_default();
        slot.0 += row.total_sales;
        slot.1 += 1;
    }

    Chart {
        kind: ChartKind::SeasonalityCurve,
        series: Series::Categorical(
            by_month
                .into_iter()
                .map(|(month, (sum, count))| (month.to_string(), sum / count as f64))
                .collect(),
        ),
    }
}

/// A uniform sample of at most `cap` cleaned records, drawn without
/// replacement by an RNG seeded with `seed`, kept in input order.
pub fn price_vs_demand(records: &[CleanSalesRecord], cap: usize, seed: u64) -> Chart {
    let amount = cap.min(records.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, records.len(), amount).into_vec();
    picked.sort_unstable();

    Chart {
        kind: ChartKind::PriceVsDemand,
        series: Series::Scatter(
            picked
                .into_iter()
                .map(|i| (records[i].unit_price, records[i].units_sold))
                .collect(),
        ),
    }
}

/// Build all five charts in [`ChartKind::ALL`] order.
pub fn build_charts(
    rows: &[MonthlyAggregate],
    records: &[CleanSalesRecord],
    options: &ReportOptions,
) -> Vec<Chart> {
    vec![
        monthly_sales_trend(rows),
        top_products(rows, options.top_n),
        atc_breakdown(rows),
        seasonality_curve(rows),
        price_vs_demand(records, options.sample_cap, options.sample_seed),
    ]
}

/// Sum values per label, then order by total descending. Ties keep label
/// order.
fn ranked_totals<'a>(values: impl Iterator<Item = (Option<&'a str>, f64)>) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for (label, value) in values {
        if let Some(label) = label {
            *totals.entry(label).or_default() += value;
        }
    }

    let mut ranked: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(label, total)| (label.to_string(), total))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Write `chart` as `<dir>/<file_stem>.csv`, creating `dir` if absent.
pub fn save_chart(chart: &Chart, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("{}.csv", chart.kind.file_stem()));

    write_atomically(&path, |file| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(chart.kind.columns())?;
        match &chart.series {
            Series::Categorical(points) => {
                for (label, value) in points {
                    writer.write_record([label.clone(), value.to_string()])?;
                }
            }
            Series::Scatter(points) => {
                for (price, units) in points {
                    writer.write_record([price.to_string(), units.to_string()])?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    })?;

    Ok(path)
}

/// Write every chart dataset plus `charts.json` into `dir`.
pub fn write_charts(charts: &[Chart], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(charts.len() + 1);
    let mut manifest = Vec::with_capacity(charts.len());

    for chart in charts {
        let path = save_chart(chart, dir)?;
        let (x_label, y_label) = chart.kind.axis_labels();
        manifest.push(ManifestEntry {
            chart: chart.kind,
            file: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            title: chart.kind.title(),
            x_label,
            y_label,
            points: chart.series.len(),
        });
        written.push(path);
    }

    let manifest_path = dir.join("charts.json");
    write_atomically(&manifest_path, |file| {
        serde_json::to_writer_pretty(file, &manifest)?;
        Ok(())
    })?;
    written.push(manifest_path);

    info!("Chart datasets saved to {}", dir.display());
    Ok(written)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
