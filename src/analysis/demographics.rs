use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{AgeBucket, AgeCounts, MonthlyRow};

/// Age mix of one rak over the month, with each bucket's share in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDemographics {
    pub rak: String,
    pub total: u64,
    pub kid: u64,
    pub teen: u64,
    pub adult: u64,
    pub elder: u64,
    pub kid_pct: f64,
    pub teen_pct: f64,
    pub adult_pct: f64,
    pub elder_pct: f64,
}

pub fn by_category(rows: &[MonthlyRow]) -> Vec<CategoryDemographics> {
    let mut totals: BTreeMap<&str, (u64, AgeCounts)> = BTreeMap::new();
    for row in rows {
        let (total, ages) = totals.entry(row.category.as_str()).or_default();
        *total += row.total;
        ages.kid += row.kid;
        ages.teen += row.teen;
        ages.adult += row.adult;
        ages.elder += row.elder;
    }

    totals
        .into_iter()
        .map(|(rak, (total, ages))| {
            let known = ages.sum();
            let share = |bucket| percent(ages.get(bucket), known);
            CategoryDemographics {
                rak: rak.to_string(),
                total,
                kid: ages.kid,
                teen: ages.teen,
                adult: ages.adult,
                elder: ages.elder,
                kid_pct: share(AgeBucket::Kid),
                teen_pct: share(AgeBucket::Teen),
                adult_pct: share(AgeBucket::Adult),
                elder_pct: share(AgeBucket::Elder),
            }
        })
        .collect()
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(d: u32, rak: &str, kid: u64, teen: u64, adult: u64, elder: u64) -> MonthlyRow {
        let total = kid + teen + adult + elder;
        MonthlyRow {
            date: NaiveDate::from_ymd_opt(2025, 7, d).unwrap(),
            category: rak.into(),
            total,
            male: total,
            female: 0,
            kid,
            teen,
            adult,
            elder,
        }
    }

    #[test]
    fn sums_age_buckets_per_rak() {
        let rows = [
            row(1, "fruits", 1, 1, 2, 0),
            row(2, "fruits", 1, 0, 2, 2),
            row(1, "dairy", 0, 0, 0, 0),
        ];

        let summary = by_category(&rows);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].rak, "dairy");
        assert_eq!(summary[0].kid_pct, 0.0);
        let fruits = &summary[1];
        assert_eq!(fruits.total, 9);
        assert_eq!(fruits.adult, 4);
        assert!((fruits.kid_pct - 200.0 / 9.0).abs() < 1e-9);
        let shares = fruits.kid_pct + fruits.teen_pct + fruits.adult_pct + fruits.elder_pct;
        assert!((shares - 100.0).abs() < 1e-9);
    }
}
