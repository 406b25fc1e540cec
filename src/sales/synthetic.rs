//! Dummy sales ledger for trying the analysis without a real point-of-sale feed.

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::models::Month;
use crate::storage::write_csv;

pub const MAX_UNITS_PER_DAY: u32 = 50;

pub const DEFAULT_CATALOGUE: [(&str, &str); 8] = [
    ("Samsung Smart TV", "electronics"),
    ("Philips Rice Cooker", "electronics"),
    ("Fresh Apples", "fruits"),
    ("Aqua 600ml", "drinks"),
    ("Indomie Goreng", "instant_food"),
    ("Dove Shampoo", "personal_care"),
    ("Sari Roti", "bakery"),
    ("Ultra Milk", "dairy"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesLine {
    pub date: NaiveDate,
    pub item_name: String,
    pub category: String,
    pub units_sold: u32,
}

/// One line per day per catalogue item with `0..=MAX_UNITS_PER_DAY` units.
pub fn generate_month<R: Rng>(
    month: Month,
    catalogue: &[(&str, &str)],
    rng: &mut R,
) -> Vec<SalesLine> {
    month
        .days()
        .flat_map(move |date| {
            catalogue
                .iter()
                .map(move |(item, category)| (date, *item, *category))
        })
        .map(|(date, item_name, category)| SalesLine {
            date,
            item_name: item_name.to_string(),
            category: category.to_string(),
            units_sold: rng.gen_range(0..=MAX_UNITS_PER_DAY),
        })
        .collect()
}

pub fn write_sales_csv(path: &Path, lines: &[SalesLine]) -> Result<()> {
    write_csv(path, lines, None)
}
