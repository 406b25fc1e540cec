use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::SalesRecord;

/// Source of per-transaction or per-day sales, normalized to one numeric
/// signal per record.
pub trait SalesFeed {
    /// Records dated within `from..=to`.
    fn fetch_sales(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SalesRecord>>;
}

/// How a ledger row turns into a sales metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesSignal {
    /// Use the numeric value column (e.g. units sold).
    #[default]
    Sum,
    /// Every row counts as one transaction.
    Count,
}

/// Headered CSV ledger with at least `date` and `category` columns.
#[derive(Debug, Clone)]
pub struct CsvSalesFeed {
    path: PathBuf,
    signal: SalesSignal,
    value_column: String,
}

impl CsvSalesFeed {
    pub fn new(
        path: impl Into<PathBuf>,
        signal: SalesSignal,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            signal,
            value_column: value_column.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SalesFeed for CsvSalesFeed {
    fn fetch_sales(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SalesRecord>> {
        let path = self.path.as_path();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open sales file: {}", path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read sales header: {}", path.display()))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| anyhow!("sales file {} has no '{name}' column", path.display()))
        };
        let date_idx = column("date")?;
        let category_idx = column("category")?;
        let value_idx = match self.signal {
            SalesSignal::Sum => Some(column(self.value_column.as_str())?),
            SalesSignal::Count => None,
        };

        let mut records = Vec::new();
        for (line_num, result) in reader.records().enumerate() {
            let line = line_num + 2;
            let row = result.with_context(|| {
                format!("Failed to read line {line} in sales file: {}", path.display())
            })?;

            let raw_date = row.get(date_idx).unwrap_or_default().trim();
            let date = parse_sales_date(raw_date)
                .with_context(|| format!("line {line} in {}", path.display()))?;
            if date < from || date > to {
                continue;
            }

            let category = row.get(category_idx).unwrap_or_default().trim();
            if category.is_empty() {
                bail!("line {line} in {}: empty category", path.display());
            }

            let sales_metric = match value_idx {
                Some(idx) => {
                    let raw = row.get(idx).unwrap_or_default().trim();
                    let value: f64 = raw.parse().map_err(|_| {
                        anyhow!("line {line} in {}: '{raw}' is not a number", path.display())
                    })?;
                    if !value.is_finite() {
                        bail!("line {line} in {}: non-finite sales value", path.display());
                    }
                    value
                }
                None => 1.0,
            };

            records.push(SalesRecord {
                date,
                category: category.to_string(),
                sales_metric,
            });
        }

        Ok(records)
    }
}

/// Accepts plain dates and timestamps that start with one.
fn parse_sales_date(raw: &str) -> Result<NaiveDate> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|err| anyhow!("invalid date '{raw}': {err}"))
}
