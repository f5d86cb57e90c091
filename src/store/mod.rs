//! Versioned room document storage.
//!
//! The store keeps one JSON document per room plus a version counter and
//! a watch channel. Writes are conditional on the caller's expected
//! version, which is what lets the manager run optimistic commits, and
//! every committed write is pushed to subscribers. Documents cross this
//! boundary serialized wholesale; there is no field-level patching.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::game::{Room, RoomCode};

pub mod errors;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use memory::InMemoryStore;

/// Monotonic token identifying one committed room document.
pub type Version = u64;

/// Backend holding the shared room documents.
///
/// Implementations must linearize writes per room: [`RoomStore::store`]
/// succeeds only when the current version equals `expected`.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Persists a brand-new room at version 1.
    async fn create(&self, room: &Room) -> StoreResult<Version>;

    /// Loads the current document and its version.
    async fn load(&self, code: &RoomCode) -> StoreResult<(Room, Version)>;

    /// Conditionally replaces the document, failing with
    /// [`StoreError::VersionMismatch`] when another writer committed in
    /// between. Returns the new version.
    async fn store(
        &self,
        code: &RoomCode,
        room: &Room,
        expected: Version,
    ) -> StoreResult<Version>;

    /// Watch channel following the room's committed states. Delivery is
    /// latest-value-wins: a slow reader skips intermediate versions.
    async fn subscribe(&self, code: &RoomCode) -> StoreResult<watch::Receiver<Room>>;
}
