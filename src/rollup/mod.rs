//! Fan-in of every station's reports for a month into one dataset.

pub mod dataset;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::{Month, MonthlyRow};
use crate::report::format;
use crate::storage::StorageLayout;

pub use dataset::{read_monthly_csv, write_monthly_csv};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedReport {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum MonthlyRollup {
    /// At least one report parsed. Rows are sorted by date then rak.
    Data {
        rows: Vec<MonthlyRow>,
        skipped: Vec<SkippedReport>,
    },
    /// No report of the month could be used. Distinct from a month whose
    /// reports all count zero visitors.
    NoData { skipped: Vec<SkippedReport> },
}

impl MonthlyRollup {
    pub fn rows(&self) -> &[MonthlyRow] {
        match self {
            MonthlyRollup::Data { rows, .. } => rows,
            MonthlyRollup::NoData { .. } => &[],
        }
    }

    pub fn skipped(&self) -> &[SkippedReport] {
        match self {
            MonthlyRollup::Data { skipped, .. } | MonthlyRollup::NoData { skipped } => skipped,
        }
    }

    pub fn has_data(&self) -> bool {
        matches!(self, MonthlyRollup::Data { .. })
    }
}

/// Parses every report under the month's station directories. Malformed
/// reports are logged and skipped; only I/O failures abort the rollup.
pub fn collect_month(layout: &StorageLayout, month: Month) -> Result<MonthlyRollup> {
    let month_dir = layout.month_dir(month);
    if !month_dir.is_dir() {
        log_warn!("no report directory for {month} at {}", month_dir.display());
        return Ok(MonthlyRollup::NoData {
            skipped: Vec::new(),
        });
    }

    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for station_dir in sorted_entries(&month_dir)? {
        if !station_dir.is_dir() {
            continue;
        }
        for report_path in sorted_entries(&station_dir)? {
            if !report_path.is_file() {
                continue;
            }
            let parsed = parse_report_file(&report_path)?
                .and_then(|row| check_placement(row, month, &station_dir));
            match parsed {
                Ok(row) => {
                    log_debug!("parsed {}", report_path.display());
                    rows.push(row);
                }
                Err(reason) => {
                    log_warn!(
                        "skipping malformed report {}: {reason}",
                        report_path.display()
                    );
                    skipped.push(SkippedReport {
                        path: report_path,
                        reason,
                    });
                }
            }
        }
    }

    log_info!(
        "rollup {month}: {} reports parsed, {} skipped",
        rows.len(),
        skipped.len()
    );

    if rows.is_empty() {
        log_warn!("rollup {month}: no valid data this month");
        return Ok(MonthlyRollup::NoData { skipped });
    }

    rows.sort();
    Ok(MonthlyRollup::Data { rows, skipped })
}

/// Collects the month and, when there is data, writes the monthly CSV.
pub fn run_rollup(layout: &StorageLayout, month: Month) -> Result<MonthlyRollup> {
    let rollup = collect_month(layout, month)?;
    if let MonthlyRollup::Data { rows, .. } = &rollup {
        let path = layout.monthly_file(month);
        write_monthly_csv(&path, rows)?;
        log_info!("monthly dataset written to {}", path.display());
    }
    Ok(rollup)
}

/// Outer error: the file could not be read. Inner error: it is not a report.
fn parse_report_file(path: &Path) -> Result<std::result::Result<MonthlyRow, String>> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read report {}", path.display()))?;
    let parsed = String::from_utf8(bytes)
        .map_err(|_| "not valid UTF-8".to_string())
        .and_then(|text| format::parse(&text).map_err(|err| format!("{err:#}")));
    Ok(parsed.map(|record| MonthlyRow::from(&record)))
}

/// A report only counts for the month and rak directory it was filed under.
fn check_placement(
    row: MonthlyRow,
    month: Month,
    station_dir: &Path,
) -> std::result::Result<MonthlyRow, String> {
    let dir_name = station_dir
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    if row.category != dir_name {
        return Err(format!(
            "rak '{}' does not match station directory '{dir_name}'",
            row.category
        ));
    }
    if !month.contains(row.date) {
        return Err(format!("report dated {} filed under {month}", row.date));
    }
    Ok(row)
}

/// Directory entries sorted by path, hidden entries (in-flight writes) excluded.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}
