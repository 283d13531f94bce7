use sentix_core::RecordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record id already in history: {0}")]
    DuplicateId(String),

    #[error("invalid seed record: {0}")]
    Seed(#[from] RecordError),
}
