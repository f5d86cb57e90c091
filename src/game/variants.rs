//! The two rule sets behind one dispatchable trait.
//!
//! Everything the round flow needs to know about a variant lives here:
//! hand size, scoring, win direction, the close threshold, bookkeeping
//! applied to the winner and loser, who starts the next round, and how
//! card visibility behaves. The state machine is parameterized by
//! [`GameVariant`] and never branches on the variant itself.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{cmp::Ordering, fmt};

use super::constants;
use super::entities::{Card, Player, Rank};

/// Who takes the first turn of a fresh round.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StarterRule {
    /// The first seated player starts every round.
    FirstPlayer,
    /// The previous round's loser starts; a random player when there is
    /// no previous loser (e.g. after a tie).
    PreviousLoser,
}

#[enum_dispatch]
pub trait VariantRules {
    /// Cards held by each player.
    fn hand_size(&self) -> usize;

    /// Score of a hand under this variant's table. Pure.
    fn score(&self, hand: &[Card]) -> u8;

    /// Normalized comparison: `Greater` means the first score wins the
    /// round, regardless of whether the variant plays high or low.
    fn compare_scores(&self, a: u8, b: u8) -> Ordering;

    /// Minimum own-hand score required to close a round, if any.
    fn min_close_score(&self) -> Option<u8>;

    /// Win/loss bookkeeping after a decided (non-tie) round.
    fn apply_round_win(&self, winner: &mut Player, loser: &mut Player);

    fn starter_rule(&self) -> StarterRule;

    /// Visibility mask for a freshly dealt hand, given the player's
    /// accumulated ventanita wins.
    fn fresh_mask(&self, wins: u32) -> Vec<bool>;

    /// Flips a hand face-up at round resolution.
    fn reveal_hand(&self, player: &mut Player);
}

/// "31": three cards, best same-suit sum, higher wins, lives at stake.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Classic31;

impl Classic31 {
    const fn card_points(rank: Rank) -> u8 {
        match rank {
            Rank::Ace => 11,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Jack | Rank::Knight | Rank::King => 10,
        }
    }
}

impl VariantRules for Classic31 {
    fn hand_size(&self) -> usize {
        constants::CLASSIC31_HAND_SIZE
    }

    fn score(&self, hand: &[Card]) -> u8 {
        // Best sum among cards sharing a suit; off-suit cards never add up.
        let mut totals = [0u8; 4];
        for card in hand {
            totals[card.1 as usize] += Self::card_points(card.0);
        }
        totals.into_iter().max().unwrap_or(0)
    }

    fn compare_scores(&self, a: u8, b: u8) -> Ordering {
        a.cmp(&b)
    }

    fn min_close_score(&self) -> Option<u8> {
        Some(constants::CLASSIC31_CLOSE_SCORE)
    }

    fn apply_round_win(&self, winner: &mut Player, loser: &mut Player) {
        winner.session_wins += 1;
        loser.lives = loser.lives.saturating_sub(1);
    }

    fn starter_rule(&self) -> StarterRule {
        StarterRule::FirstPlayer
    }

    fn fresh_mask(&self, _wins: u32) -> Vec<bool> {
        Vec::new()
    }

    fn reveal_hand(&self, _player: &mut Player) {}
}

/// "Ventanita": four cards, fixed per-rank table, lower wins, no lives.
/// Wins accumulate toward a match point instead.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Ventanita;

impl Ventanita {
    const fn card_points(rank: Rank) -> u8 {
        match rank {
            Rank::Jack => 0,
            Rank::Ace | Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Knight | Rank::King => 10,
        }
    }
}

impl VariantRules for Ventanita {
    fn hand_size(&self) -> usize {
        constants::VENTANITA_HAND_SIZE
    }

    fn score(&self, hand: &[Card]) -> u8 {
        hand.iter().map(|card| Self::card_points(card.0)).sum()
    }

    fn compare_scores(&self, a: u8, b: u8) -> Ordering {
        b.cmp(&a)
    }

    fn min_close_score(&self) -> Option<u8> {
        None
    }

    fn apply_round_win(&self, winner: &mut Player, loser: &mut Player) {
        // At match point the accumulated round wins convert into a
        // session win and both counters restart.
        if winner.ventanita_wins >= constants::VENTANITA_MATCH_POINT {
            winner.session_wins += 1;
            winner.ventanita_wins = 0;
            loser.ventanita_wins = 0;
        } else {
            winner.ventanita_wins += 1;
        }
    }

    fn starter_rule(&self) -> StarterRule {
        StarterRule::PreviousLoser
    }

    fn fresh_mask(&self, wins: u32) -> Vec<bool> {
        // Accumulated wins peek open the window: the first min(wins, 4)
        // positions are dealt face-up.
        let revealed = wins.min(constants::VENTANITA_HAND_SIZE as u32) as usize;
        (0..constants::VENTANITA_HAND_SIZE).map(|i| i < revealed).collect()
    }

    fn reveal_hand(&self, player: &mut Player) {
        player.visibility = vec![true; player.hand.len()];
    }
}

/// The rule set a room plays under.
#[enum_dispatch(VariantRules)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GameVariant {
    Classic31,
    Ventanita,
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Classic31(_) => "31",
            Self::Ventanita(_) => "ventanita",
        };
        write!(f, "{repr}")
    }
}

impl Serialize for GameVariant {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GameVariant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "31" => Ok(Classic31.into()),
            "ventanita" => Ok(Ventanita.into()),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["31", "ventanita"],
            )),
        }
    }
}
