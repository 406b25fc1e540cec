use std::path::Path;

use anyhow::{Context, Result};

use crate::models::MonthlyRow;
use crate::storage::write_csv;

const MONTHLY_HEADER: [&str; 9] = [
    "date", "rak", "total", "Male", "Female", "kid", "teen", "adult", "elder",
];

/// Writes the monthly dataset with header
/// `date,rak,total,Male,Female,kid,teen,adult,elder`.
pub fn write_monthly_csv(path: &Path, rows: &[MonthlyRow]) -> Result<()> {
    write_csv(path, rows, Some(&MONTHLY_HEADER[..]))
}

pub fn read_monthly_csv(path: &Path) -> Result<Vec<MonthlyRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open monthly dataset: {}", path.display()))?;

    let mut rows = Vec::new();
    for (line_num, result) in reader.deserialize().enumerate() {
        let row: MonthlyRow = result.with_context(|| {
            format!("Failed to parse line {} in monthly dataset: {}", line_num + 2, path.display())
        })?;
        rows.push(row);
    }
    Ok(rows)
}
