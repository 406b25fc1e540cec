use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDateTime;
use log::info;

use crate::models::{CounterStore, Month, ReportRecord};
use crate::storage::{validate_category, write_atomic, StorageLayout};

use super::format;

#[derive(Debug, Clone)]
pub struct WrittenReport {
    pub path: PathBuf,
    pub record: ReportRecord,
}

/// Persists one report per flush for a single station.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    layout: StorageLayout,
    category: String,
}

impl ReportWriter {
    pub fn new(layout: StorageLayout, category: impl Into<String>) -> Result<Self> {
        let category = category.into();
        validate_category(&category)?;
        Ok(Self { layout, category })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Snapshots and clears `store`, then writes the snapshot as an immutable
    /// report. If the write fails the snapshot is merged back into the store
    /// before the error is returned.
    pub fn flush(&self, store: &mut CounterStore, at: NaiveDateTime) -> Result<WrittenReport> {
        let record = ReportRecord {
            reported_at: at,
            category: self.category.clone(),
            counts: store.take(),
        };

        match self.persist(&record) {
            Ok(path) => {
                info!(
                    "Report for rak {} written to {} (total {})",
                    self.category,
                    path.display(),
                    record.counts.total
                );
                Ok(WrittenReport { path, record })
            }
            Err(err) => {
                store.restore(record.counts);
                Err(err)
            }
        }
    }

    fn persist(&self, record: &ReportRecord) -> Result<PathBuf> {
        let month = Month::of(record.reported_at.date());
        let dir = self.layout.station_dir(month, &self.category);
        let base = StorageLayout::report_file_name(record.reported_at);

        // Reports are immutable; a second flush within the same second gets a suffix.
        let mut path = dir.join(&base);
        let mut attempt = 1;
        while path.exists() {
            let stem = base.trim_end_matches(".txt");
            path = dir.join(format!("{stem}_{attempt}.txt"));
            attempt += 1;
        }

        write_atomic(&path, format::render(record).as_bytes())?;
        Ok(path)
    }
}
