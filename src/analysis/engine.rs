use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{AnalysisRow, Insight, MonthlyRow, SalesRecord};

use super::quantile::quantile;

pub const VISITOR_QUANTILE: f64 = 0.75;
pub const SALES_QUANTILE: f64 = 0.25;

/// Cut-offs computed over the whole joined dataset of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub visitors: f64,
    pub sales: f64,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    /// Ordered by date then category.
    pub rows: Vec<AnalysisRow>,
    /// `None` when there were no visitor rows to analyze.
    pub thresholds: Option<Thresholds>,
}

type CellKey = (NaiveDate, String);

pub fn analyze(visits: &[MonthlyRow], sales: &[SalesRecord]) -> Analysis {
    let mut visitors_by_cell: BTreeMap<CellKey, u64> = BTreeMap::new();
    for row in visits {
        *visitors_by_cell
            .entry((row.date, row.category.clone()))
            .or_insert(0) += row.total;
    }

    let mut sales_by_cell: BTreeMap<CellKey, f64> = BTreeMap::new();
    for record in sales {
        *sales_by_cell
            .entry((record.date, record.category.clone()))
            .or_insert(0.0) += record.sales_metric;
    }

    // Left join: a cell without sales has sold nothing.
    let joined: Vec<(CellKey, u64, f64)> = visitors_by_cell
        .into_iter()
        .map(|(key, visitors)| {
            let total_sales = sales_by_cell.get(&key).copied().unwrap_or(0.0);
            (key, visitors, total_sales)
        })
        .collect();

    let visitor_values: Vec<f64> = joined.iter().map(|(_, v, _)| *v as f64).collect();
    let sales_values: Vec<f64> = joined.iter().map(|(_, _, s)| *s).collect();
    let thresholds = match (
        quantile(&visitor_values, VISITOR_QUANTILE),
        quantile(&sales_values, SALES_QUANTILE),
    ) {
        (Some(visitors), Some(sales)) => Some(Thresholds { visitors, sales }),
        _ => None,
    };

    let rows = joined
        .into_iter()
        .map(|((date, category), total_visitors, total_sales)| {
            let insight = thresholds
                .as_ref()
                .map(|t| label(total_visitors as f64, total_sales, t))
                .unwrap_or(Insight::Normal);
            AnalysisRow {
                date,
                category,
                total_visitors,
                total_sales,
                conversion_rate: conversion_rate(total_sales, total_visitors),
                insight,
            }
        })
        .collect();

    Analysis { rows, thresholds }
}

/// Sales per visitor. Zero visitors, negative or non-finite results all give 0.
pub fn conversion_rate(total_sales: f64, total_visitors: u64) -> f64 {
    if total_visitors == 0 {
        return 0.0;
    }
    let rate = total_sales / total_visitors as f64;
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        0.0
    }
}

/// Both comparisons are inclusive, so a row sitting on both thresholds
/// satisfies both conditions; the first branch wins.
pub fn label(total_visitors: f64, total_sales: f64, thresholds: &Thresholds) -> Insight {
    if total_visitors >= thresholds.visitors && total_sales <= thresholds.sales {
        Insight::OpportunityMissed
    } else if total_visitors <= thresholds.visitors && total_sales >= thresholds.sales {
        Insight::MandatoryProduct
    } else {
        Insight::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn visit(d: u32, category: &str, total: u64) -> MonthlyRow {
        MonthlyRow {
            date: day(d),
            category: category.into(),
            total,
            male: total,
            female: 0,
            kid: 0,
            teen: 0,
            adult: total,
            elder: 0,
        }
    }

    fn sale(d: u32, category: &str, metric: f64) -> SalesRecord {
        SalesRecord {
            date: day(d),
            category: category.into(),
            sales_metric: metric,
        }
    }

    #[test]
    fn visitors_without_sales_get_zero() {
        let analysis = analyze(&[visit(1, "electronics", 100)], &[]);
        let row = &analysis.rows[0];
        assert_eq!(row.total_visitors, 100);
        assert_eq!(row.total_sales, 0.0);
        assert_eq!(row.conversion_rate, 0.0);
    }

    #[test]
    fn duplicates_are_summed_per_cell() {
        let visits = [visit(1, "dairy", 10), visit(1, "dairy", 30), visit(1, "bakery", 5)];
        let sales = [sale(1, "dairy", 4.0), sale(1, "dairy", 6.0), sale(2, "dairy", 99.0)];

        let analysis = analyze(&visits, &sales);

        assert_eq!(analysis.rows.len(), 2);
        assert_eq!(analysis.rows[0].category, "bakery");
        let dairy = &analysis.rows[1];
        assert_eq!(dairy.total_visitors, 40);
        assert_eq!(dairy.total_sales, 10.0);
        assert!((dairy.conversion_rate - 0.25).abs() < 1e-9);
    }

    #[test]
    fn zero_visitors_never_divide() {
        assert_eq!(conversion_rate(12.0, 0), 0.0);
        assert_eq!(conversion_rate(0.0, 0), 0.0);
        assert_eq!(conversion_rate(-3.0, 2), 0.0);
        assert_eq!(conversion_rate(f64::INFINITY, 2), 0.0);

        let analysis = analyze(&[visit(3, "drinks", 0)], &[sale(3, "drinks", 7.0)]);
        assert_eq!(analysis.rows[0].conversion_rate, 0.0);
    }

    #[test]
    fn busiest_cell_without_sales_is_opportunity_missed() {
        let visits = [
            visit(1, "a", 10),
            visit(1, "b", 20),
            visit(1, "c", 30),
            visit(1, "d", 200),
        ];
        let sales = [sale(1, "a", 5.0), sale(1, "b", 8.0), sale(1, "c", 2.0)];

        let analysis = analyze(&visits, &sales);
        let thresholds = analysis.thresholds.unwrap();
        assert!((thresholds.visitors - 72.5).abs() < 1e-9);
        assert!((thresholds.sales - 1.5).abs() < 1e-9);

        let labels: Vec<Insight> = analysis.rows.iter().map(|r| r.insight).collect();
        assert_eq!(
            labels,
            vec![
                Insight::MandatoryProduct,
                Insight::MandatoryProduct,
                Insight::MandatoryProduct,
                Insight::OpportunityMissed
            ]
        );
    }

    #[test]
    fn boundary_row_prefers_opportunity_missed() {
        let thresholds = Thresholds {
            visitors: 50.0,
            sales: 5.0,
        };
        assert_eq!(label(50.0, 5.0, &thresholds), Insight::OpportunityMissed);
        assert_eq!(label(49.0, 5.0, &thresholds), Insight::MandatoryProduct);
        assert_eq!(label(60.0, 9.0, &thresholds), Insight::Normal);
        assert_eq!(label(10.0, 1.0, &thresholds), Insight::Normal);
    }

    #[test]
    fn single_cell_sits_on_both_thresholds() {
        let analysis = analyze(&[visit(1, "dairy", 8)], &[sale(1, "dairy", 3.0)]);
        assert_eq!(analysis.rows[0].insight, Insight::OpportunityMissed);
    }

    #[test]
    fn empty_input_has_no_thresholds() {
        let analysis = analyze(&[], &[sale(1, "dairy", 3.0)]);
        assert!(analysis.rows.is_empty());
        assert!(analysis.thresholds.is_none());
    }
}
