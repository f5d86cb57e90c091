//! Session-level error types.

use thiserror::Error;

use crate::game::RoomError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The call was illegal under the game rules. The shared state was
    /// consistent; nothing is retried.
    #[error(transparent)]
    Rule(#[from] RoomError),
    /// The store failed underneath the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Another writer kept committing first and the retry budget ran out.
    #[error("commit conflict after {attempts} attempts")]
    Conflict { attempts: u32 },
}

pub type SessionResult<T> = Result<T, SessionError>;
