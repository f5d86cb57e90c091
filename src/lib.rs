//! # Baraja
//!
//! A session manager for two-player Spanish-deck card games, built as a
//! type-safe state machine with optimistic concurrency control.
//!
//! Two variants of the same draw-and-discard family share one engine:
//! **Classic 31** (three cards, chase a same-suit 31, lives at stake) and
//! **Ventanita** (four cards, lowest total wins, progress revealed one
//! window at a time). All game logic lives in total functions over a
//! [`Room`] document; shared state goes through a versioned store, and
//! every mutation commits with a version check so two clients can never
//! corrupt a room by racing.
//!
//! ## Architecture
//!
//! A room moves through four phases:
//!
//! - **Waiting**: a seat is open, or a round just resolved
//! - **Playing**: draw-and-decide turns alternate between the players
//! - **RoundClosing**: one player locked in a score; the opponent gets one final turn
//! - **Finished**: a player ran out of lives
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, deck, scoring variants, and the room state machine
//! - [`store`]: Versioned room persistence and change subscriptions
//! - [`room`]: Optimistic commit loop and per-player sessions
//!
//! ## Example
//!
//! ```
//! use baraja::{Classic31, PlayerName, Room, RoomCode};
//!
//! // Host a room; seating a guest deals the first round.
//! let mut room = Room::create(
//!     RoomCode::new("AB12CD"),
//!     PlayerName::new("ana"),
//!     Classic31.into(),
//! )
//! .unwrap();
//! room.seat_guest(PlayerName::new("ben")).unwrap();
//! assert_eq!(room.turn.as_str(), "ana");
//! ```

/// Core game logic: cards, scoring variants, and the room state machine.
pub mod game;
pub use game::{
    ActionKind, ActionRecord, Card, Classic31, Decision, Deck, GameVariant, Player, PlayerName,
    Rank, Room, RoomCode, RoomError, RoomPhase, RoundOutcome, Suit, VariantRules, Ventanita,
    constants,
};

/// Shared-room coordination: optimistic commits and player sessions.
pub mod room;
pub use room::{PlayerSession, RoomManager, SessionError, SessionResult};

/// Versioned persistence for room documents.
pub mod store;
pub use store::{InMemoryStore, RoomStore, StoreError, StoreResult, Version};
