use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::Month;

/// Directory layout shared by stations, the rollup and the analysis run.
///
/// ```text
/// <root>/daily/<MM-YYYY>/<rak>/report_<YYYYmmdd_HHMMSS>.txt
/// <root>/monthly/<MM-YYYY>.csv
/// <root>/sales/sales_data_<MM-YYYY>.csv
/// <root>/analysis/<MM-YYYY>/sales_vs_visits.csv
/// <root>/analysis/<MM-YYYY>/demographics_by_rak.csv
/// ```
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn month_dir(&self, month: Month) -> PathBuf {
        self.root.join("daily").join(month.to_string())
    }

    pub fn station_dir(&self, month: Month, category: &str) -> PathBuf {
        self.month_dir(month).join(category)
    }

    pub fn report_file_name(at: NaiveDateTime) -> String {
        format!("report_{}.txt", at.format("%Y%m%d_%H%M%S"))
    }

    pub fn monthly_file(&self, month: Month) -> PathBuf {
        self.root.join("monthly").join(format!("{month}.csv"))
    }

    pub fn sales_file(&self, month: Month) -> PathBuf {
        self.root
            .join("sales")
            .join(format!("sales_data_{month}.csv"))
    }

    pub fn analysis_dir(&self, month: Month) -> PathBuf {
        self.root.join("analysis").join(month.to_string())
    }

    pub fn analysis_file(&self, month: Month) -> PathBuf {
        self.analysis_dir(month).join("sales_vs_visits.csv")
    }

    pub fn demographics_file(&self, month: Month) -> PathBuf {
        self.analysis_dir(month).join("demographics_by_rak.csv")
    }
}

/// Station ids become directory names, so they must be a single path component.
pub fn validate_category(category: &str) -> Result<()> {
    if category.is_empty()
        || category.trim() != category
        || category.starts_with('.')
        || category.contains(['/', '\\'])
        || category.chars().any(char::is_control)
    {
        bail!("invalid station category '{category}'");
    }
    Ok(())
}

/// Writes `contents` next to `path` under a hidden temporary name and renames it
/// into place, so readers never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory {}", parent.display()))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;
    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    fs::write(&tmp_path, contents)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            tmp_path.display(),
            path.display()
        )
    })
}

/// Serializes `rows` to `path`. With an explicit header the file always has
/// one, even when `rows` is empty.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T], header: Option<&[&str]>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(header.is_none())
        .from_writer(Vec::new());
    if let Some(header) = header {
        writer
            .write_record(header)
            .with_context(|| format!("failed to encode header for {}", path.display()))?;
    }
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to encode row for {}", path.display()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush {}: {err}", path.display()))?;
    write_atomic(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn layout_partitions_by_month_and_station() {
        let layout = StorageLayout::new("Reports");
        let month = Month::new(2025, 7).unwrap();
        assert_eq!(
            layout.station_dir(month, "dairy"),
            PathBuf::from("Reports/daily/07-2025/dairy")
        );
        assert_eq!(
            layout.monthly_file(month),
            PathBuf::from("Reports/monthly/07-2025.csv")
        );
        assert_eq!(
            layout.sales_file(month),
            PathBuf::from("Reports/sales/sales_data_07-2025.csv")
        );
        let at = NaiveDate::from_ymd_opt(2025, 7, 3)
            .unwrap()
            .and_hms_opt(8, 5, 9)
            .unwrap();
        assert_eq!(StorageLayout::report_file_name(at), "report_20250703_080509.txt");
    }

    #[test]
    fn category_must_be_single_component() {
        assert!(validate_category("instant_food").is_ok());
        assert!(validate_category("").is_err());
        assert!(validate_category("../etc").is_err());
        assert!(validate_category("a/b").is_err());
        assert!(validate_category(" dairy").is_err());
        assert!(validate_category("dai\nry").is_err());
        assert!(validate_category("dairy\r").is_err());
        assert!(validate_category("da\tiry").is_err());
    }

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.txt");
        write_atomic(&path, b"hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty());
    }
}
