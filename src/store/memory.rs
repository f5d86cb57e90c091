//! Single-process store backend.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{RwLock, watch};

use crate::game::{Room, RoomCode};

use super::{RoomStore, StoreError, StoreResult, Version};

/// One room's persisted state.
struct Slot {
    version: Version,
    document: String,
    publisher: watch::Sender<Room>,
}

/// In-memory [`RoomStore`] with full versioning semantics. Rooms are held
/// as serialized JSON documents so every read and write round-trips the
/// document exactly the way a remote store would.
#[derive(Default)]
pub struct InMemoryStore {
    rooms: RwLock<HashMap<RoomCode, Slot>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn encode(room: &Room) -> StoreResult<String> {
        serde_json::to_string(room).map_err(StoreError::Encode)
    }
}

#[async_trait]
impl RoomStore for InMemoryStore {
    async fn create(&self, room: &Room) -> StoreResult<Version> {
        let document = Self::encode(room)?;
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room.code) {
            // Generated codes are never checked for uniqueness upstream.
            log::warn!("Room code {} collided, overwriting", room.code);
        }
        let (publisher, _) = watch::channel(room.clone());
        rooms.insert(
            room.code.clone(),
            Slot {
                version: 1,
                document,
                publisher,
            },
        );
        Ok(1)
    }

    async fn load(&self, code: &RoomCode) -> StoreResult<(Room, Version)> {
        let rooms = self.rooms.read().await;
        let slot = rooms
            .get(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        let room = serde_json::from_str(&slot.document).map_err(StoreError::Decode)?;
        Ok((room, slot.version))
    }

    async fn store(
        &self,
        code: &RoomCode,
        room: &Room,
        expected: Version,
    ) -> StoreResult<Version> {
        let document = Self::encode(room)?;
        let mut rooms = self.rooms.write().await;
        let slot = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        if slot.version != expected {
            return Err(StoreError::VersionMismatch {
                expected,
                actual: slot.version,
            });
        }
        slot.version += 1;
        slot.document = document;
        slot.publisher.send_replace(room.clone());
        Ok(slot.version)
    }

    async fn subscribe(&self, code: &RoomCode) -> StoreResult<watch::Receiver<Room>> {
        let rooms = self.rooms.read().await;
        let slot = rooms
            .get(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        Ok(slot.publisher.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Classic31, PlayerName, Room};

    fn sample_room(code: &str) -> Room {
        Room::create(RoomCode::new(code), PlayerName::new("ana"), Classic31.into())
            .expect("room should build")
    }

    // === Create/Load Tests ===

    #[tokio::test]
    async fn test_create_then_load_round_trips_the_document() {
        let store = InMemoryStore::new();
        let room = sample_room("AAAA11");

        let version = store.create(&room).await.unwrap();
        assert_eq!(version, 1);

        let (loaded, loaded_version) = store.load(&room.code).await.unwrap();
        assert_eq!(loaded, room);
        assert_eq!(loaded_version, 1);
    }

    #[tokio::test]
    async fn test_load_unknown_code_is_not_found() {
        let store = InMemoryStore::new();
        let result = store.load(&RoomCode::new("NOPE00")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_collision_overwrites_and_restarts_versioning() {
        let store = InMemoryStore::new();
        let first = sample_room("AAAA11");
        store.create(&first).await.unwrap();
        store.store(&first.code, &first, 1).await.unwrap();

        let second = sample_room("AAAA11");
        let version = store.create(&second).await.unwrap();
        assert_eq!(version, 1, "a colliding create starts the room over");

        let (loaded, _) = store.load(&second.code).await.unwrap();
        assert_eq!(loaded, second);
    }

    // === Conditional Write Tests ===

    #[tokio::test]
    async fn test_store_bumps_the_version() {
        let store = InMemoryStore::new();
        let mut room = sample_room("AAAA11");
        store.create(&room).await.unwrap();

        room.seat_guest(PlayerName::new("ben")).unwrap();
        let version = store.store(&room.code, &room, 1).await.unwrap();
        assert_eq!(version, 2);

        let (loaded, loaded_version) = store.load(&room.code).await.unwrap();
        assert_eq!(loaded.players.len(), 2);
        assert_eq!(loaded_version, 2);
    }

    #[tokio::test]
    async fn test_stale_write_is_rejected() {
        let store = InMemoryStore::new();
        let mut room = sample_room("AAAA11");
        store.create(&room).await.unwrap();

        room.seat_guest(PlayerName::new("ben")).unwrap();
        store.store(&room.code, &room, 1).await.unwrap();

        // a second writer still holding version 1
        let result = store.store(&room.code, &room, 1).await;
        match result {
            Err(StoreError::VersionMismatch { expected, actual }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected a version mismatch, got {other:?}"),
        }

        let (_, version) = store.load(&room.code).await.unwrap();
        assert_eq!(version, 2, "the stale write must not commit");
    }

    #[tokio::test]
    async fn test_store_unknown_code_is_not_found() {
        let store = InMemoryStore::new();
        let room = sample_room("AAAA11");
        let result = store.store(&room.code, &room, 1).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    // === Subscription Tests ===

    #[tokio::test]
    async fn test_subscribers_see_committed_writes() {
        let store = InMemoryStore::new();
        let mut room = sample_room("AAAA11");
        store.create(&room).await.unwrap();

        let mut rx = store.subscribe(&room.code).await.unwrap();
        assert_eq!(rx.borrow().players.len(), 1);

        room.seat_guest(PlayerName::new("ben")).unwrap();
        store.store(&room.code, &room, 1).await.unwrap();

        rx.changed().await.expect("publisher should be alive");
        assert_eq!(rx.borrow().players.len(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_code_is_not_found() {
        let store = InMemoryStore::new();
        let result = store.subscribe(&RoomCode::new("NOPE00")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
