pub mod format;
pub mod writer;

pub use writer::{ReportWriter, WrittenReport};
