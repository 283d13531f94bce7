//! Core types for Sentix: sentiment labels, classification records,
//! aggregate statistics, log queries, and the CSV export format.

pub mod export;
pub mod label;
pub mod query;
pub mod record;
pub mod stats;

pub use export::{ExportError, from_csv, to_csv};
pub use label::{SentimentLabel, UnknownLabel};
pub use query::HistoryQuery;
pub use record::{Classification, ClassificationRecord, RecordError};
pub use stats::AggregateStats;
