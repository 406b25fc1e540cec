use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use chrono::{Datelike, Local, NaiveDate};

/// Calendar month used to partition report directories and monthly files.
/// Rendered as `MM-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("month {month} is out of range 1..=12");
        }
        Ok(Self { year, month })
    }

    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day()
            .iter_days()
            .take_while(move |day| *day <= last)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{}", self.month, self.year)
    }
}

impl FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let (month, year) = value
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("invalid month '{value}', expected MM-YYYY"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| anyhow!("invalid month number in '{value}'"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| anyhow!("invalid year in '{value}'"))?;
        Self::new(year, month)
    }
}
