//! Stage entry points of the batch pipeline.
//!
//! Orchestrates load → transform → write for the cleaning and aggregation
//! stages. Each stage checks its input exists first and reports
//! [`PipelineError::MissingInput`] otherwise, without writing anything.

use std::path::{Path, PathBuf};

use insights_core::error::{PipelineError, Result};
use insights_core::settings::{PipelinePaths, ReportOptions};
use tracing::info;

use crate::aggregator::{AggregateTotals, SalesAggregator};
use crate::cleaner::{CleanReport, Cleaner};
use crate::reader::{load_clean_records, load_raw_records};
use crate::report::{build_charts, write_charts};
use crate::writer::{write_aggregates, write_clean_records};

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of a successful cleaning stage.
#[derive(Debug, Clone)]
pub struct CleanStageOutcome {
    pub report: CleanReport,
    pub output: PathBuf,
}

/// Result of a successful aggregation stage.
#[derive(Debug, Clone)]
pub struct AggregateStageOutcome {
    pub totals: AggregateTotals,
    pub output: PathBuf,
    /// Chart dataset files, empty when charts were skipped.
    pub chart_files: Vec<PathBuf>,
}

// ── Stages ────────────────────────────────────────────────────────────────────

/// Clean the raw export at `paths.raw` into `paths.clean`.
pub fn run_clean(paths: &PipelinePaths) -> Result<CleanStageOutcome> {
    paths.validate()?;
    require_input(
        &paths.raw,
        "Place the raw sales export at this location or pass --raw-path.",
    )?;

    let raw = load_raw_records(&paths.raw)?;
    let outcome = Cleaner::clean(&raw);
    let report = outcome.report;

    info!(
        "Cleaning kept {} of {} rows ({} missing required fields, {} out of range)",
        report.rows_kept, report.rows_read, report.dropped_missing, report.dropped_out_of_range
    );

    write_clean_records(&paths.clean, &outcome.table)?;
    info!("Cleaned data saved to {}", paths.clean.display());

    Ok(CleanStageOutcome {
        report,
        output: paths.clean.clone(),
    })
}

/// Aggregate the cleaned file at `paths.clean` into `paths.aggregate` and,
/// when `charts` is set, write the chart datasets into `paths.charts_dir`.
///
/// The aggregate is computed in full before anything is written, so an
/// aggregation failure leaves no output behind.
pub fn run_aggregate(
    paths: &PipelinePaths,
    options: &ReportOptions,
    charts: bool,
) -> Result<AggregateStageOutcome> {
    paths.validate()?;
    require_input(&paths.clean, "Run the clean step first.")?;

    let table = load_clean_records(&paths.clean)?;
    let rows = SalesAggregator::aggregate(&table)?;
    let totals = SalesAggregator::calculate_totals(&rows);

    write_aggregates(&paths.aggregate, &rows)?;
    info!(
        "Aggregated {} cleaned rows into {} monthly groups, saved to {}",
        table.len(),
        totals.groups,
        paths.aggregate.display()
    );

    let chart_files = if charts {
        let built = build_charts(&rows, &table.records, options);
        write_charts(&built, &paths.charts_dir)?
    } else {
        Vec::new()
    };

    Ok(AggregateStageOutcome {
        totals,
        output: paths.aggregate.clone(),
        chart_files,
    })
}

/// Clean, then aggregate.
pub fn run_all(
    paths: &PipelinePaths,
    options: &ReportOptions,
    charts: bool,
) -> Result<(CleanStageOutcome, AggregateStageOutcome)> {
    let cleaned = run_clean(paths)?;
    let aggregated = run_aggregate(paths, options, charts)?;
    Ok((cleaned, aggregated))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn require_input(path: &Path, hint: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
            hint: hint.to_string(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RAW: &str = "\
date,product_id,product_name,atc_code,region,retailer_id,units_sold,unit_price,sales_value,promotion_flag
2024-01-05,A ,Aspirin, N02BA01,X,R1,10,5.0,50.0,1
2024-01-20,A,Aspirin,N02BA01,X,R1,-3,5.0,-15.0,0
2024-01-28,A,Aspirin,N02BA01,X,R2,20,7.0,140.0,0
2024-02-02,B,Bisoprolol,C07AB07,Y,R1,4,2.5,10.0,
,C,Captopril,C09AA01,Y,R1,1,1.0,1.0,0
";

    fn setup(raw: Option<&str>) -> (TempDir, PipelinePaths) {
        let dir = TempDir::new().unwrap();
        let paths = PipelinePaths::under(dir.path());
        if let Some(contents) = raw {
            std::fs::create_dir_all(paths.raw.parent().unwrap()).unwrap();
            std::fs::write(&paths.raw, contents).unwrap();
        }
        (dir, paths)
    }

    // ── missing inputs ────────────────────────────────────────────────────────

    #[test]
    fn test_run_clean_missing_raw_writes_nothing() {
        let (_dir, paths) = setup(None);

        let err = run_clean(&paths).unwrap_err();
        match &err {
            PipelineError::MissingInput { path, .. } => assert_eq!(path, &paths.raw),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("pharma_sales.csv"));
        assert!(!paths.clean.exists());
    }

    #[test]
    fn test_run_aggregate_missing_clean_writes_nothing() {
        let (_dir, paths) = setup(None);

        let err = run_aggregate(&paths, &ReportOptions::default(), true).unwrap_err();
        assert!(err.is_missing_input());
        assert!(!paths.aggregate.exists());
        assert!(!paths.charts_dir.exists());
    }

    // ── end to end ────────────────────────────────────────────────────────────

    #[test]
    fn test_run_clean_writes_cleaned_file() {
        let (_dir, paths) = setup(Some(RAW));

        let outcome = run_clean(&paths).unwrap();
        assert_eq!(outcome.report.rows_read, 5);
        assert_eq!(outcome.report.dropped_missing, 1);
        assert_eq!(outcome.report.dropped_out_of_range, 1);
        assert_eq!(outcome.report.rows_kept, 3);

        let contents = std::fs::read_to_string(&paths.clean).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "2024-01-05,A,Aspirin,N02BA01,X,R1,10,5,50,1");
    }

    #[test]
    fn test_run_all_end_to_end() {
        let (_dir, paths) = setup(Some(RAW));

        let (_, aggregated) = run_all(&paths, &ReportOptions::default(), true).unwrap();
        assert_eq!(aggregated.totals.groups, 2);
        assert_eq!(aggregated.totals.total_units, 34);
        assert_eq!(aggregated.chart_files.len(), 6);

        let contents = std::fs::read_to_string(&paths.aggregate).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2024-01-01,A,Aspirin,N02BA01,X,30,190.0,6.0,1"
        );
        assert_eq!(
            lines[2],
            "2024-02-01,B,Bisoprolol,C07AB07,Y,4,10.0,2.5,0"
        );
    }

    #[test]
    fn test_run_all_groups_like_in_memory_aggregation() {
        let raw = "\
date,product_id,product_name,atc_code,region,retailer_id,units_sold,unit_price,sales_value,promotion_flag
2024-01-05,A,None ,N02BA01,X,R1,10,5.0,50.0,0
2024-01-06,A,,N02BA01,X,R1,20,5.0,100.0,0
2024-01-07,A,Aspirin,N02BA01,X,R1,1,5.0,5.0,0
";
        let (_dir, paths) = setup(Some(raw));

        let in_memory = {
            let table = load_raw_records(&paths.raw).unwrap();
            SalesAggregator::aggregate(&Cleaner::clean(&table).table).unwrap()
        };
        let (_, aggregated) = run_all(&paths, &ReportOptions::default(), false).unwrap();
        let from_file = SalesAggregator::aggregate(&load_clean_records(&paths.clean).unwrap()).unwrap();

        assert_eq!(in_memory.len(), 2);
        assert_eq!(aggregated.totals.groups, in_memory.len());
        assert_eq!(from_file, in_memory);
        assert_eq!(in_memory[0].product_name, None);
        assert_eq!(in_memory[0].total_units, 30);
    }

    #[test]
    fn test_run_clean_drops_fractional_and_out_of_range_units() {
        let raw = "\
date,product_id,product_name,atc_code,region,retailer_id,units_sold,unit_price,sales_value,promotion_flag
2024-01-05,A,Aspirin,N02BA01,X,R1,2.5,1,1,0
2024-01-05,A,Aspirin,N02BA01,X,R1,9223372036854775808,1,1,0
2024-01-05,A,Aspirin,N02BA01,X,R1,3,1,1,0
";
        let (_dir, paths) = setup(Some(raw));

        let outcome = run_clean(&paths).unwrap();
        assert_eq!(outcome.report.dropped_missing, 2);
        assert_eq!(outcome.report.rows_kept, 1);

        let contents = std::fs::read_to_string(&paths.clean).unwrap();
        assert!(!contents.contains("9223372036854775807"));
        assert_eq!(
            contents.lines().nth(1),
            Some("2024-01-05,A,Aspirin,N02BA01,X,R1,3,1,1,0")
        );
    }

    #[test]
    fn test_run_aggregate_skip_charts() {
        let (_dir, paths) = setup(Some(RAW));
        run_clean(&paths).unwrap();

        let outcome = run_aggregate(&paths, &ReportOptions::default(), false).unwrap();
        assert!(outcome.chart_files.is_empty());
        assert!(!paths.charts_dir.exists());
        assert!(paths.aggregate.exists());
    }

    #[test]
    fn test_run_all_with_everything_filtered_out() {
        let raw = "date,product_id,product_name,atc_code,region,retailer_id,units_sold,unit_price,sales_value,promotion_flag\n\
                   2024-01-05,A,Aspirin,N02BA01,X,R1,0,5.0,0.0,0\n";
        let (_dir, paths) = setup(Some(raw));

        let (cleaned, aggregated) = run_all(&paths, &ReportOptions::default(), true).unwrap();
        assert_eq!(cleaned.report.rows_kept, 0);
        assert_eq!(aggregated.totals.groups, 0);

        let contents = std::fs::read_to_string(&paths.aggregate).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_run_aggregate_failure_writes_no_output() {
        let (_dir, paths) = setup(None);
        std::fs::create_dir_all(paths.clean.parent().unwrap()).unwrap();
        std::fs::write(
            &paths.clean,
            "date,product_id,region,retailer_id,units_sold,unit_price,sales_value\n\
             2024-01-05,A,X,R1,10,5,50\n",
        )
        .unwrap();

        let err = run_aggregate(&paths, &ReportOptions::default(), true).unwrap_err();
        assert!(matches!(err, PipelineError::AggregationFailure(_)));
        assert!(!paths.aggregate.exists());
    }

    #[test]
    fn test_run_clean_rejects_overwriting_raw() {
        let (_dir, mut paths) = setup(Some(RAW));
        paths.clean = paths.raw.clone();

        let err = run_clean(&paths).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(std::fs::read_to_string(&paths.raw).unwrap(), RAW);
    }
}
