//! Text layout of a station report.
//!
//! ```text
//! Report Time: 2025-07-01 21:00:00
//! Rak: dairy
//! Total People Detected: 3
//! Gender Counts:
//!   Male: 1
//!   Female: 2
//! Age Category Counts:
//!   kid: 0
//!   teen: 1
//!   adult: 2
//!   elder: 0
//! ```
//!
//! Every line is tagged and sits at a fixed position. Parsing checks both, so
//! a reordered, truncated or retagged file is rejected rather than guessed at.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDateTime;

use crate::models::{AgeCounts, CounterSnapshot, GenderCounts, ReportRecord};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const REPORT_TIME: &str = "Report Time: ";
const RAK: &str = "Rak: ";
const TOTAL: &str = "Total People Detected: ";
const GENDER_HEADER: &str = "Gender Counts:";
const MALE: &str = "  Male: ";
const FEMALE: &str = "  Female: ";
const AGE_HEADER: &str = "Age Category Counts:";
const KID: &str = "  kid: ";
const TEEN: &str = "  teen: ";
const ADULT: &str = "  adult: ";
const ELDER: &str = "  elder: ";

const LINE_COUNT: usize = 11;

pub fn render(record: &ReportRecord) -> String {
    let counts = &record.counts;
    let lines = [
        format!("{REPORT_TIME}{}", record.reported_at.format(TIMESTAMP_FORMAT)),
        format!("{RAK}{}", record.category),
        format!("{TOTAL}{}", counts.total),
        GENDER_HEADER.to_string(),
        format!("{MALE}{}", counts.gender.male),
        format!("{FEMALE}{}", counts.gender.female),
        AGE_HEADER.to_string(),
        format!("{KID}{}", counts.age.kid),
        format!("{TEEN}{}", counts.age.teen),
        format!("{ADULT}{}", counts.age.adult),
        format!("{ELDER}{}", counts.age.elder),
    ];
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

pub fn parse(text: &str) -> Result<ReportRecord> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() != LINE_COUNT {
        bail!("expected {LINE_COUNT} lines, found {}", lines.len());
    }

    let reported_at = field(&lines, 0, REPORT_TIME).and_then(|value| {
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .with_context(|| format!("invalid report time '{value}'"))
    })?;

    let category = field(&lines, 1, RAK)?;
    if category.is_empty() || category.trim() != category {
        bail!("invalid rak '{category}'");
    }

    header(&lines, 3, GENDER_HEADER)?;
    header(&lines, 6, AGE_HEADER)?;

    let counts = CounterSnapshot {
        total: count(&lines, 2, TOTAL)?,
        gender: GenderCounts {
            male: count(&lines, 4, MALE)?,
            female: count(&lines, 5, FEMALE)?,
        },
        age: AgeCounts {
            kid: count(&lines, 7, KID)?,
            teen: count(&lines, 8, TEEN)?,
            adult: count(&lines, 9, ADULT)?,
            elder: count(&lines, 10, ELDER)?,
        },
    };

    if !counts.is_consistent() {
        bail!(
            "inconsistent counts: total {} vs gender {} vs age {}",
            counts.total,
            counts.gender.sum(),
            counts.age.sum()
        );
    }

    Ok(ReportRecord {
        reported_at,
        category: category.to_string(),
        counts,
    })
}

fn field<'a>(lines: &[&'a str], index: usize, tag: &str) -> Result<&'a str> {
    lines[index]
        .strip_prefix(tag)
        .ok_or_else(|| anyhow!("line {index}: expected '{}'", tag.trim()))
}

fn header(lines: &[&str], index: usize, expected: &str) -> Result<()> {
    if lines[index] != expected {
        bail!("line {index}: expected '{expected}'");
    }
    Ok(())
}

fn count(lines: &[&str], index: usize, tag: &str) -> Result<u64> {
    let value = field(lines, index, tag)?;
    value
        .parse()
        .map_err(|_| anyhow!("line {index}: '{value}' is not a count"))
}
