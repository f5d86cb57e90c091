//! Shared-room coordination.
//!
//! [`RoomManager`] runs every mutation as an optimistic transaction
//! against a [`RoomStore`](crate::store::RoomStore), retrying commits
//! that lose a version race. [`PlayerSession`] is one player's handle on
//! a room and keeps the drawn card staged client-side until the player
//! decides, so an undecided draw never appears in a committed document.

pub mod errors;
mod manager;
mod session;

pub use errors::{SessionError, SessionResult};
pub use manager::RoomManager;
pub use session::PlayerSession;
