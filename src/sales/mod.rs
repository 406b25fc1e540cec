pub mod feed;
pub mod synthetic;

pub use feed::{CsvSalesFeed, SalesFeed, SalesSignal};
