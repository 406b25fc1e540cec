pub mod analysis;
pub mod counts;
pub mod month;
pub mod report;
pub mod sample;

pub use analysis::{AnalysisRow, Insight, SalesRecord};
pub use counts::{AgeCounts, CounterSnapshot, CounterStore, GenderCounts, Recorded};
pub use month::Month;
pub use report::{MonthlyRow, ReportRecord};
pub use sample::{AgeBucket, Gender, Sample};
