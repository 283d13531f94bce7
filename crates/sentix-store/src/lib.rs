//! Storage layer: the in-memory session history and its read-only snapshots.

mod error;
mod history;
pub mod seed;

pub use error::StoreError;
pub use history::{HistorySnapshot, HistoryStore};
