use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::counts::{AgeCounts, CounterSnapshot, GenderCounts};

/// One flushed period of a station, identified by `(category, reported_at)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    pub reported_at: NaiveDateTime,
    pub category: String,
    pub counts: CounterSnapshot,
}

/// Row of the monthly dataset; column names follow the rollup file header.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthlyRow {
    pub date: NaiveDate,
    #[serde(rename = "rak")]
    pub category: String,
    pub total: u64,
    #[serde(rename = "Male")]
    pub male: u64,
    #[serde(rename = "Female")]
    pub female: u64,
    pub kid: u64,
    pub teen: u64,
    pub adult: u64,
    pub elder: u64,
}

impl From<&ReportRecord> for MonthlyRow {
    fn from(record: &ReportRecord) -> Self {
        let counts = &record.counts;
        Self {
            date: record.reported_at.date(),
            category: record.category.clone(),
            total: counts.total,
            male: counts.gender.male,
            female: counts.gender.female,
            kid: counts.age.kid,
            teen: counts.age.teen,
            adult: counts.age.adult,
            elder: counts.age.elder,
        }
    }
}

impl MonthlyRow {
    pub fn counts(&self) -> CounterSnapshot {
        CounterSnapshot {
            total: self.total,
            gender: GenderCounts {
                male: self.male,
                female: self.female,
            },
            age: AgeCounts {
                kid: self.kid,
                teen: self.teen,
                adult: self.adult,
                elder: self.elder,
            },
        }
    }
}
