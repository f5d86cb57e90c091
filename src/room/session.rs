//! Per-player facade holding the client-side staging slot.

use std::sync::Arc;

use tokio::sync::watch;

use crate::game::{Card, Decision, PlayerName, Room, RoomCode, RoomError};

use super::errors::SessionResult;
use super::manager::RoomManager;

/// One player's handle on a room.
///
/// The session owns the staging slot: a drawn card lives here, on the
/// client side only, until the player decides what to do with it. The
/// committed document never holds an undecided card, so the opponent can
/// watch every commit and still learn nothing about the draw beyond the
/// fact that it happened.
///
/// A player who draws and then walks away leaves the room stuck on their
/// turn; there is no timeout or forfeit.
pub struct PlayerSession {
    manager: Arc<RoomManager>,
    code: RoomCode,
    player: PlayerName,
    staged: Option<Card>,
}

impl PlayerSession {
    pub fn new(manager: Arc<RoomManager>, code: RoomCode, player: &str) -> Self {
        Self {
            manager,
            code,
            player: PlayerName::new(player),
            staged: None,
        }
    }

    #[must_use]
    pub fn player(&self) -> &PlayerName {
        &self.player
    }

    /// The drawn card waiting on a decision, if any.
    #[must_use]
    pub fn staged_card(&self) -> Option<Card> {
        self.staged
    }

    /// Draw the top card of the deck into the staging slot.
    pub async fn draw_from_deck(&mut self) -> SessionResult<Card> {
        if self.staged.is_some() {
            return Err(RoomError::AlreadyHoldingDrawnCard.into());
        }
        let player = self.player.clone();
        let (_, card) = self
            .manager
            .mutate(&self.code, |room| room.draw_from_deck(&player))
            .await?;
        self.staged = Some(card);
        Ok(card)
    }

    /// Take the top card of the discard pile into the staging slot.
    pub async fn draw_from_discard(&mut self) -> SessionResult<Card> {
        if self.staged.is_some() {
            return Err(RoomError::AlreadyHoldingDrawnCard.into());
        }
        let player = self.player.clone();
        let (_, card) = self
            .manager
            .mutate(&self.code, |room| room.draw_from_discard(&player))
            .await?;
        self.staged = Some(card);
        Ok(card)
    }

    /// Settle the staged card: keep the hand or swap the card in. The
    /// slot is cleared only once the commit lands, so a rejected decision
    /// leaves the card staged and the player can decide again.
    pub async fn decide(&mut self, decision: Decision) -> SessionResult<Room> {
        let drawn = self.staged.ok_or(RoomError::NoDrawnCard)?;
        let player = self.player.clone();
        let (room, ()) = self
            .manager
            .mutate(&self.code, |room| room.decide(&player, drawn, decision))
            .await?;
        self.staged = None;
        Ok(room)
    }

    /// Lock in this player's score, giving the opponent one final turn.
    /// Refused while a drawn card is still staged.
    pub async fn close_round(&mut self) -> SessionResult<Room> {
        if self.staged.is_some() {
            return Err(RoomError::AlreadyHoldingDrawnCard.into());
        }
        let player = self.player.clone();
        let (room, ()) = self
            .manager
            .mutate(&self.code, |room| room.close_round(&player))
            .await?;
        Ok(room)
    }

    /// Deal the next round once the previous one has resolved.
    pub async fn start_new_round(&self) -> SessionResult<Room> {
        let (room, ()) = self
            .manager
            .mutate(&self.code, |room| room.start_new_round())
            .await?;
        Ok(room)
    }

    /// Snapshot of the committed room state.
    pub async fn room(&self) -> SessionResult<Room> {
        self.manager.room(&self.code).await
    }

    /// Watch channel yielding each committed state of the room.
    pub async fn subscribe(&self) -> SessionResult<watch::Receiver<Room>> {
        self.manager.subscribe(&self.code).await
    }
}
