//! Card game engine - deck, rule variants, and the room state machine.
//!
//! This module provides the pure game logic:
//! - Spanish-deck cards and the 40-card draw pile
//! - Two rule sets (Classic31, Ventanita) behind one dispatchable trait
//! - The Room aggregate with its turn and round-closing protocol
//! - The bounded opponent action log
//!
//! Nothing here is async or aware of storage; the `room` and `store`
//! modules wrap these types for shared use.

pub mod constants;
pub mod entities;
pub mod state_machine;
pub mod variants;

pub use entities::{
    ActionKind, ActionLog, ActionRecord, Card, Deck, DeckError, ParseCardError, Player,
    PlayerName, Rank, RoomCode, Suit,
};
pub use state_machine::{Decision, Room, RoomError, RoomPhase, RoomResult, RoundOutcome};
pub use variants::{Classic31, GameVariant, StarterRule, Ventanita, VariantRules};
