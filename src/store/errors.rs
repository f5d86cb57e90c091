//! Store error types.

use thiserror::Error;

use crate::game::RoomCode;

use super::Version;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room {0} not found")]
    NotFound(RoomCode),
    #[error("version mismatch: expected {expected}, found {actual}")]
    VersionMismatch { expected: Version, actual: Version },
    #[error("failed to encode room document: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode room document: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("transient store failure: {0}")]
    Transient(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
