use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized sales signal for one (date, category) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub category: String,
    pub sales_metric: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Insight {
    /// High traffic with low sales.
    #[serde(rename = "Opportunity Missed")]
    OpportunityMissed,
    /// Low traffic that still sells.
    #[serde(rename = "Mandatory Product")]
    MandatoryProduct,
    Normal,
}

impl Insight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Insight::OpportunityMissed => "Opportunity Missed",
            Insight::MandatoryProduct => "Mandatory Product",
            Insight::Normal => "Normal",
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub date: NaiveDate,
    pub category: String,
    pub total_visitors: u64,
    pub total_sales: f64,
    pub conversion_rate: f64,
    pub insight: Insight,
}
