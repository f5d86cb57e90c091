//! Optimistic commit loop for room mutations.

use std::sync::Arc;

use tokio::sync::watch;

use crate::game::{GameVariant, PlayerName, Room, RoomCode, RoomError, constants};
use crate::store::{RoomStore, StoreError};

use super::errors::{SessionError, SessionResult};

/// Runs room mutations as optimistic transactions against a [`RoomStore`].
///
/// Every mutation loads the current document, applies a pure state-machine
/// operation to a local copy, and commits it with a version check. When two
/// writers race, the loser's commit is rejected and the whole cycle re-runs
/// against fresh state, so the operation re-validates its preconditions
/// before it is retried.
pub struct RoomManager {
    /// Backing store holding the committed room documents.
    store: Arc<dyn RoomStore>,
    /// How many times a conflicted commit is re-run before giving up.
    retry_limit: u32,
}

impl RoomManager {
    /// Create a manager with the default retry budget.
    ///
    /// # Arguments
    ///
    /// * `store` - Store holding the committed room documents.
    ///
    /// # Returns
    ///
    /// A new `RoomManager`.
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self {
            store,
            retry_limit: constants::DEFAULT_COMMIT_RETRIES,
        }
    }

    /// Override how many times a conflicted commit is retried. Zero means
    /// a single attempt with no retries.
    #[must_use]
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Create a room with a freshly generated code and the host seated.
    ///
    /// # Arguments
    ///
    /// * `host` - Display name of the hosting player.
    /// * `variant` - Game variant the room will play.
    ///
    /// # Returns
    ///
    /// The committed room, still waiting for a guest. Its code is in
    /// `room.code`.
    pub async fn create_room(&self, host: &str, variant: GameVariant) -> SessionResult<Room> {
        let code = RoomCode::generate();
        let room = Room::create(code, PlayerName::new(host), variant)?;
        self.store.create(&room).await?;
        log::info!("Room {}: created by {} ({})", room.code, room.players[0].name, variant);
        Ok(room)
    }

    /// Seat a guest in an existing room, which starts the first round.
    ///
    /// # Arguments
    ///
    /// * `code` - Code of the room to join.
    /// * `guest` - Display name of the joining player.
    ///
    /// # Returns
    ///
    /// The committed room with both players seated and the first round
    /// dealt.
    pub async fn join_room(&self, code: &RoomCode, guest: &str) -> SessionResult<Room> {
        let guest = PlayerName::new(guest);
        let (room, ()) = self
            .mutate(code, |room| room.seat_guest(guest.clone()))
            .await?;
        log::info!("Room {code}: {guest} joined, round started");
        Ok(room)
    }

    /// Snapshot of the committed state of a room.
    pub async fn room(&self, code: &RoomCode) -> SessionResult<Room> {
        let (room, _) = self.store.load(code).await?;
        Ok(room)
    }

    /// Watch channel yielding each committed state of a room.
    pub async fn subscribe(&self, code: &RoomCode) -> SessionResult<watch::Receiver<Room>> {
        Ok(self.store.subscribe(code).await?)
    }

    /// Run one operation as an optimistic transaction.
    ///
    /// Loads the room, applies `op` to a local copy, and commits the copy
    /// with a version check. A rejected commit re-runs the whole cycle
    /// against fresh state until it lands or the retry budget is spent.
    /// Rule errors from `op` abort immediately without retrying: a move
    /// that is illegal against current state stays illegal until the
    /// caller sees the new state.
    ///
    /// # Arguments
    ///
    /// * `code` - Code of the room to mutate.
    /// * `op` - State-machine operation. May run several times, each time
    ///   against a freshly loaded copy.
    ///
    /// # Returns
    ///
    /// The committed room together with the operation's value.
    pub async fn mutate<F, T>(&self, code: &RoomCode, mut op: F) -> SessionResult<(Room, T)>
    where
        F: FnMut(&mut Room) -> Result<T, RoomError>,
    {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let (mut room, version) = self.store.load(code).await?;
            let value = op(&mut room)?;
            match self.store.store(code, &room, version).await {
                Ok(_) => return Ok((room, value)),
                Err(StoreError::VersionMismatch { .. }) if attempts <= self.retry_limit => {
                    log::warn!("Room {code}: commit conflict on attempt {attempts}, retrying");
                }
                Err(StoreError::VersionMismatch { .. }) => {
                    return Err(SessionError::Conflict { attempts });
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::game::{Classic31, RoomPhase, Ventanita};
    use crate::store::{InMemoryStore, StoreResult, Version};

    use super::*;

    /// Store wrapper that counts loads, to observe how often an
    /// operation was attempted.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryStore,
        loads: AtomicU32,
    }

    #[async_trait]
    impl RoomStore for CountingStore {
        async fn create(&self, room: &Room) -> StoreResult<Version> {
            self.inner.create(room).await
        }

        async fn load(&self, code: &RoomCode) -> StoreResult<(Room, Version)> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(code).await
        }

        async fn store(
            &self,
            code: &RoomCode,
            room: &Room,
            expected_version: Version,
        ) -> StoreResult<Version> {
            self.inner.store(code, room, expected_version).await
        }

        async fn subscribe(&self, code: &RoomCode) -> StoreResult<watch::Receiver<Room>> {
            self.inner.subscribe(code).await
        }
    }

    // === Room lifecycle ===

    #[tokio::test]
    async fn test_create_room_persists_the_host() {
        let manager = RoomManager::new(Arc::new(InMemoryStore::new()));

        let room = manager.create_room("ana", Classic31.into()).await.unwrap();

        assert_eq!(room.code.as_str().len(), 6);
        let loaded = manager.room(&room.code).await.unwrap();
        assert_eq!(loaded.players.len(), 1);
        assert_eq!(loaded.players[0].name.as_str(), "ana");
        assert_eq!(loaded.phase, RoomPhase::Waiting { last_outcome: None });
    }

    #[tokio::test]
    async fn test_join_room_starts_play_and_commits() {
        let manager = RoomManager::new(Arc::new(InMemoryStore::new()));
        let room = manager.create_room("ana", Ventanita.into()).await.unwrap();

        let joined = manager.join_room(&room.code, "ben").await.unwrap();

        assert_eq!(joined.players.len(), 2);
        assert_eq!(joined.phase, RoomPhase::Playing);
        let loaded = manager.room(&room.code).await.unwrap();
        assert_eq!(loaded.phase, RoomPhase::Playing);
    }

    #[tokio::test]
    async fn test_join_unknown_room_is_not_found() {
        let manager = RoomManager::new(Arc::new(InMemoryStore::new()));

        let result = manager.join_room(&RoomCode::new("GHOST1"), "ben").await;

        assert!(matches!(
            result,
            Err(SessionError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_follows_commits() {
        let manager = RoomManager::new(Arc::new(InMemoryStore::new()));
        let room = manager.create_room("ana", Classic31.into()).await.unwrap();
        let mut updates = manager.subscribe(&room.code).await.unwrap();

        manager.join_room(&room.code, "ben").await.unwrap();

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().players.len(), 2);
    }

    // === Retry accounting ===

    #[tokio::test]
    async fn test_rule_errors_abort_without_retrying() {
        let store = Arc::new(CountingStore::default());
        let manager = RoomManager::new(store.clone());
        let room = manager.create_room("ana", Classic31.into()).await.unwrap();
        manager.join_room(&room.code, "ben").await.unwrap();
        store.loads.store(0, Ordering::SeqCst);

        let result = manager.join_room(&room.code, "carla").await;

        assert!(matches!(
            result,
            Err(SessionError::Rule(RoomError::RoomFull))
        ));
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mutate_returns_operation_value() {
        let manager = RoomManager::new(Arc::new(InMemoryStore::new()));
        let room = manager.create_room("ana", Classic31.into()).await.unwrap();
        let joined = manager.join_room(&room.code, "ben").await.unwrap();
        let deck_before = joined.deck_len();
        let turn = joined.turn.clone();

        let (committed, card) = manager
            .mutate(&room.code, |room| room.draw_from_deck(&turn))
            .await
            .unwrap();

        assert_eq!(committed.deck_len(), deck_before - 1);
        let loaded = manager.room(&room.code).await.unwrap();
        assert_eq!(loaded.deck_len(), deck_before - 1);
        assert!(!loaded.discard_pile().contains(&card));
    }
}
