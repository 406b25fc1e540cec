pub mod demographics;
pub mod engine;
pub mod quantile;

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

use crate::models::{AnalysisRow, Month};
use crate::rollup::read_monthly_csv;
use crate::sales::SalesFeed;
use crate::storage::{write_csv, StorageLayout};

pub use demographics::{by_category, CategoryDemographics};
pub use engine::{analyze, conversion_rate, label, Analysis, Thresholds};

const ANALYSIS_HEADER: [&str; 6] = [
    "date",
    "category",
    "total_visitors",
    "total_sales",
    "conversion_rate",
    "insight",
];

/// Joins the month's rollup with the sales feed and writes the labelled
/// table plus the per-rak demographics next to it.
pub fn run_analysis(
    layout: &StorageLayout,
    month: Month,
    feed: &dyn SalesFeed,
) -> Result<Analysis> {
    let monthly_path = layout.monthly_file(month);
    if !monthly_path.is_file() {
        bail!(
            "no monthly dataset for {month} at {}; run the rollup first",
            monthly_path.display()
        );
    }
    let visits = read_monthly_csv(&monthly_path)?;
    let sales = feed
        .fetch_sales(month.first_day(), month.last_day())
        .with_context(|| format!("failed to load sales for {month}"))?;

    let analysis = analyze(&visits, &sales);
    match &analysis.thresholds {
        Some(t) => info!(
            "Analysis {month}: {} cells, visitor threshold {:.2}, sales threshold {:.2}",
            analysis.rows.len(),
            t.visitors,
            t.sales
        ),
        None => info!("Analysis {month}: monthly dataset has no rows"),
    }

    let analysis_path = layout.analysis_file(month);
    write_analysis_csv(&analysis_path, &analysis.rows)?;
    info!("Analysis written to {}", analysis_path.display());

    let demographics_path = layout.demographics_file(month);
    write_csv(&demographics_path, &by_category(&visits), None)?;
    info!("Demographics written to {}", demographics_path.display());

    Ok(analysis)
}

pub fn write_analysis_csv(path: &Path, rows: &[AnalysisRow]) -> Result<()> {
    write_csv(path, rows, Some(&ANALYSIS_HEADER[..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Insight;
    use chrono::NaiveDate;

    #[test]
    fn analysis_file_has_expected_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.csv");
        let rows = [AnalysisRow {
            date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            category: "electronics".into(),
            total_visitors: 100,
            total_sales: 0.0,
            conversion_rate: 0.0,
            insight: Insight::OpportunityMissed,
        }];

        write_analysis_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("date,category,total_visitors,total_sales,conversion_rate,insight")
        );
        assert_eq!(lines.next(), Some("2025-07-01,electronics,100,0.0,0.0,Opportunity Missed"));
    }

    #[test]
    fn empty_analysis_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.csv");
        write_analysis_csv(&path, &[]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "date,category,total_visitors,total_sales,conversion_rate,insight\n"
        );
    }
}
