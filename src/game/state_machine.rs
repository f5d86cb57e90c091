//! The room aggregate and its turn/phase protocol.
//!
//! A [`Room`] moves through `Waiting -> Playing -> RoundClosing -> Waiting`
//! cycles, with `RoundClosing -> Finished` as the terminal branch when a
//! player runs out of lives. Every operation is a total function: an
//! illegal call returns a [`RoomError`] and leaves the room exactly as it
//! was, never partially applied. All methods are synchronous; persisting a
//! mutated room atomically is the manager's job.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, mem};
use thiserror::Error;

use super::constants;
use super::entities::{
    ActionKind, ActionLog, ActionRecord, Card, Deck, DeckError, Player, PlayerName, RoomCode,
};
use super::variants::{GameVariant, StarterRule, VariantRules};

#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum RoomError {
    #[error("it's not your turn")]
    NotYourTurn,
    #[error("player is not seated in this room")]
    UnknownPlayer,
    #[error("room is already full")]
    RoomFull,
    #[error("a player with that name is already seated")]
    AlreadyJoined,
    #[error("room needs two seated players")]
    NotEnoughPlayers,
    #[error("round is not in progress")]
    RoundNotInProgress,
    #[error("round is still in progress")]
    RoundInProgress,
    #[error("round is already closing")]
    AlreadyClosing,
    #[error("already holding a drawn card")]
    AlreadyHoldingDrawnCard,
    #[error("no drawn card to decide on")]
    NoDrawnCard,
    #[error("discard pile is empty")]
    EmptyDiscard,
    #[error("hand index {0} is out of bounds")]
    InvalidHandIndex(usize),
    #[error("hand scores {score} but closing requires {required}")]
    ScoreTooLow { score: u8, required: u8 },
    #[error("a player is out of lives")]
    NotAllPlayersAlive,
    #[error(transparent)]
    Deck(#[from] DeckError),
}

pub type RoomResult<T> = Result<T, RoomError>;

/// What the turn holder does with a drawn card.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Decision {
    /// Send the drawn card to the discard pile unchanged.
    Keep,
    /// Put the drawn card at this hand position and discard the card it
    /// displaces.
    Swap(usize),
}

/// How the last round went. A tie carries no winner or loser.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub winner: Option<PlayerName>,
    pub winner_score: u8,
    pub loser: Option<PlayerName>,
    pub loser_score: u8,
    pub is_tie: bool,
}

impl RoundOutcome {
    /// The winner's name, or the tie label `EMPATE`.
    #[must_use]
    pub fn winner_label(&self) -> &str {
        match &self.winner {
            Some(name) => name.as_str(),
            None => constants::TIE_LABEL,
        }
    }
}

/// Where a room is in its lifecycle. Payloads exist exactly when the
/// phase says they do; there are no nullable placeholder fields.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RoomPhase {
    /// A seat is open, or a round just ended and the next one has not
    /// started. Holds the previous outcome until a new round consumes it.
    Waiting { last_outcome: Option<RoundOutcome> },
    /// A round is underway.
    Playing,
    /// One player locked in their score; the opponent gets one final
    /// draw-and-decide before resolution.
    RoundClosing { closing_player: PlayerName },
    /// A player ran out of lives. Terminal.
    Finished,
}

/// The shared room document. This is the unit of persistence: the store
/// round-trips it wholesale, and the manager commits each mutation with a
/// version check.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Room {
    pub code: RoomCode,
    pub variant: GameVariant,
    pub players: Vec<Player>,
    deck: Deck,
    discard_pile: Vec<Card>,
    pub turn: PlayerName,
    pub phase: RoomPhase,
    pub celebration: Option<String>,
    action_log: ActionLog,
}

impl Room {
    /// Builds a room with a shuffled deck and the host seated and dealt.
    /// The discard pile stays empty until a guest joins.
    pub fn create(code: RoomCode, host: PlayerName, variant: GameVariant) -> RoomResult<Self> {
        let mut deck = Deck::build();
        deck.shuffle();
        let mut player = Player::new(host.clone());
        player.hand = deck.deal(variant.hand_size())?;
        player.visibility = variant.fresh_mask(0);
        log::info!("Room {code} created by {host} ({variant})");
        Ok(Self {
            code,
            variant,
            players: vec![player],
            deck,
            discard_pile: Vec::new(),
            turn: host,
            phase: RoomPhase::Waiting { last_outcome: None },
            celebration: None,
            action_log: ActionLog::default(),
        })
    }

    /// Seats the second player, deals their hand, seeds the discard pile
    /// with one card off the top, and starts play. The host keeps the
    /// first turn.
    pub fn seat_guest(&mut self, guest: PlayerName) -> RoomResult<()> {
        if self.players.len() >= constants::ROOM_CAPACITY {
            return Err(RoomError::RoomFull);
        }
        if self.players.iter().any(|p| p.name == guest) {
            return Err(RoomError::AlreadyJoined);
        }
        let needed = self.variant.hand_size() + 1;
        if self.deck.len() < needed {
            return Err(RoomError::Deck(DeckError::InsufficientCards {
                requested: needed,
                available: self.deck.len(),
            }));
        }
        let mut player = Player::new(guest.clone());
        player.hand = self.deck.deal(self.variant.hand_size())?;
        player.visibility = self.variant.fresh_mask(0);
        self.players.push(player);
        if let Some(seed) = self.deck.draw() {
            self.discard_pile.push(seed);
        }
        self.phase = RoomPhase::Playing;
        log::info!("{guest} joined room {}", self.code);
        Ok(())
    }

    /// Draws the top card of the deck for the turn holder, reshuffling
    /// the discard pile into the deck first if the deck is empty. The
    /// card is returned without joining any hand; the caller stages it
    /// until [`Room::decide`].
    pub fn draw_from_deck(&mut self, player: &PlayerName) -> RoomResult<Card> {
        self.ensure_seated(player)?;
        self.ensure_round_active()?;
        self.ensure_turn(player)?;
        if self.deck.is_empty() {
            self.deck.reshuffle_from_discard(&mut self.discard_pile)?;
        }
        let card = self.deck.draw().ok_or(DeckError::NoCardsAvailable)?;
        self.action_log.record(player, ActionKind::DrawDeck, None);
        Ok(card)
    }

    /// Takes the face-up top of the discard pile as the staged card.
    pub fn draw_from_discard(&mut self, player: &PlayerName) -> RoomResult<Card> {
        self.ensure_seated(player)?;
        self.ensure_round_active()?;
        self.ensure_turn(player)?;
        let card = self.discard_pile.pop().ok_or(RoomError::EmptyDiscard)?;
        self.action_log
            .record(player, ActionKind::DrawDiscard, Some(card));
        Ok(card)
    }

    /// Settles a previously drawn card: keep the hand and discard it, or
    /// swap it into the hand. If the round was closing, this was the
    /// opponent's final action and the round resolves in the same call;
    /// otherwise the turn passes.
    pub fn decide(&mut self, player: &PlayerName, drawn: Card, decision: Decision) -> RoomResult<()> {
        let seat = self.seat_of(player)?;
        self.ensure_round_active()?;
        self.ensure_turn(player)?;
        if let Decision::Swap(idx) = decision {
            if idx >= self.players[seat].hand.len() {
                return Err(RoomError::InvalidHandIndex(idx));
            }
        }
        // Capture the phase before the card moves: a closing round must
        // resolve with this decide, not advance the turn.
        let closing = matches!(self.phase, RoomPhase::RoundClosing { .. });
        match decision {
            Decision::Keep => {
                self.discard_pile.push(drawn);
                self.action_log
                    .record(player, ActionKind::Discard, Some(drawn));
            }
            Decision::Swap(idx) => {
                let displaced = mem::replace(&mut self.players[seat].hand[idx], drawn);
                self.discard_pile.push(displaced);
                self.action_log
                    .record(player, ActionKind::Swap, Some(displaced));
            }
        }
        if closing {
            self.resolve_round();
        } else {
            self.advance_turn();
        }
        Ok(())
    }

    /// Locks in the turn holder's score. The opponent gets the turn for
    /// one final draw-and-decide, which resolves the round.
    pub fn close_round(&mut self, player: &PlayerName) -> RoomResult<()> {
        let seat = self.seat_of(player)?;
        match self.phase {
            RoomPhase::Playing => {}
            RoomPhase::RoundClosing { .. } => return Err(RoomError::AlreadyClosing),
            _ => return Err(RoomError::RoundNotInProgress),
        }
        self.ensure_turn(player)?;
        if let Some(required) = self.variant.min_close_score() {
            let score = self.variant.score(&self.players[seat].hand);
            if score < required {
                return Err(RoomError::ScoreTooLow { score, required });
            }
        }
        self.phase = RoomPhase::RoundClosing {
            closing_player: player.clone(),
        };
        self.advance_turn();
        Ok(())
    }

    /// Deals a fresh round: new shuffled deck, new hands, one seed card
    /// on the discard pile, masks reset, celebration and action log
    /// cleared, starting turn per the variant's rule.
    pub fn start_new_round(&mut self) -> RoomResult<()> {
        let last_outcome = match &self.phase {
            RoomPhase::Waiting { last_outcome } => last_outcome.clone(),
            RoomPhase::Finished => return Err(RoomError::NotAllPlayersAlive),
            _ => return Err(RoomError::RoundInProgress),
        };
        if self.players.len() < constants::ROOM_CAPACITY {
            return Err(RoomError::NotEnoughPlayers);
        }
        if self.players.iter().any(|p| p.lives == 0) {
            return Err(RoomError::NotAllPlayersAlive);
        }

        let variant = self.variant;
        let mut deck = Deck::build();
        deck.shuffle();
        let mut hands = Vec::with_capacity(self.players.len());
        for _ in &self.players {
            hands.push(deck.deal(variant.hand_size())?);
        }
        let seed = deck.draw().ok_or(DeckError::NoCardsAvailable)?;

        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.hand = hand;
            player.visibility = variant.fresh_mask(player.ventanita_wins);
        }
        self.deck = deck;
        self.discard_pile = vec![seed];
        self.celebration = None;
        self.action_log.clear();
        self.turn = self.starting_player(last_outcome.as_ref());
        self.phase = RoomPhase::Playing;
        log::info!("Room {}: new round, {} plays first", self.code, self.turn);
        Ok(())
    }

    // === Read accessors ===

    #[must_use]
    pub fn player(&self, name: &PlayerName) -> Option<&Player> {
        self.players.iter().find(|p| p.name == *name)
    }

    #[must_use]
    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    #[must_use]
    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    #[must_use]
    pub fn top_discard(&self) -> Option<Card> {
        self.discard_pile.last().copied()
    }

    #[must_use]
    pub fn actions_of(&self, player: &PlayerName) -> &[ActionRecord] {
        self.action_log.actions_of(player)
    }

    #[must_use]
    pub fn last_action_of(&self, player: &PlayerName) -> Option<&ActionRecord> {
        self.action_log.last_action_of(player)
    }

    // === Internals ===

    fn seat_of(&self, player: &PlayerName) -> RoomResult<usize> {
        self.players
            .iter()
            .position(|p| p.name == *player)
            .ok_or(RoomError::UnknownPlayer)
    }

    fn ensure_seated(&self, player: &PlayerName) -> RoomResult<()> {
        self.seat_of(player).map(|_| ())
    }

    fn ensure_round_active(&self) -> RoomResult<()> {
        match self.phase {
            RoomPhase::Playing | RoomPhase::RoundClosing { .. } => Ok(()),
            _ => Err(RoomError::RoundNotInProgress),
        }
    }

    fn ensure_turn(&self, player: &PlayerName) -> RoomResult<()> {
        if self.turn == *player {
            Ok(())
        } else {
            Err(RoomError::NotYourTurn)
        }
    }

    fn advance_turn(&mut self) {
        let current = self.turn.clone();
        if let Ok(seat) = self.seat_of(&current) {
            let next = (seat + 1) % self.players.len();
            self.turn = self.players[next].name.clone();
        }
    }

    /// Scores both hands, applies win/loss bookkeeping, reveals the
    /// hands, assigns a celebration token, and moves the room to Waiting
    /// or Finished. Runs inside the opponent's final decide.
    fn resolve_round(&mut self) {
        let [a, b] = &self.players[..] else {
            return;
        };
        let variant = self.variant;
        let score_a = variant.score(&a.hand);
        let score_b = variant.score(&b.hand);

        let outcome = match variant.compare_scores(score_a, score_b) {
            Ordering::Equal => RoundOutcome {
                winner: None,
                winner_score: score_a,
                loser: None,
                loser_score: score_b,
                is_tie: true,
            },
            Ordering::Greater => self.apply_win(0, 1, score_a, score_b),
            Ordering::Less => self.apply_win(1, 0, score_b, score_a),
        };

        for player in &mut self.players {
            variant.reveal_hand(player);
        }
        if let Some(token) = constants::CELEBRATION_CATALOG.choose(&mut rand::rng()) {
            self.celebration = Some((*token).to_string());
        }
        log::info!(
            "Room {}: round result {} ({}-{})",
            self.code,
            outcome.winner_label(),
            outcome.winner_score,
            outcome.loser_score
        );
        let finished = self.players.iter().any(|p| p.lives == 0);
        self.phase = if finished {
            RoomPhase::Finished
        } else {
            RoomPhase::Waiting {
                last_outcome: Some(outcome),
            }
        };
    }

    fn apply_win(
        &mut self,
        winner: usize,
        loser: usize,
        winner_score: u8,
        loser_score: u8,
    ) -> RoundOutcome {
        let outcome = RoundOutcome {
            winner: Some(self.players[winner].name.clone()),
            winner_score,
            loser: Some(self.players[loser].name.clone()),
            loser_score,
            is_tie: false,
        };
        let (first, rest) = self.players.split_at_mut(1);
        let (winner, loser) = if winner == 0 {
            (&mut first[0], &mut rest[0])
        } else {
            (&mut rest[0], &mut first[0])
        };
        self.variant.apply_round_win(winner, loser);
        outcome
    }

    fn starting_player(&self, last_outcome: Option<&RoundOutcome>) -> PlayerName {
        let starter = match self.variant.starter_rule() {
            StarterRule::FirstPlayer => self.players.first().map(|p| p.name.clone()),
            StarterRule::PreviousLoser => last_outcome
                .and_then(|outcome| outcome.loser.clone())
                .or_else(|| {
                    self.players
                        .choose(&mut rand::rng())
                        .map(|p| p.name.clone())
                }),
        };
        starter.unwrap_or_else(|| self.turn.clone())
    }
}
