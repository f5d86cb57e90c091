use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Cups,
    Coins,
    Swords,
    Clubs,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Cups, Self::Coins, Self::Swords, Self::Clubs];

    /// Single-character wire token for the suit.
    #[must_use]
    pub const fn token(self) -> char {
        match self {
            Self::Cups => 'C',
            Self::Coins => 'O',
            Self::Swords => 'E',
            Self::Clubs => 'B',
        }
    }

    #[must_use]
    pub const fn from_token(c: char) -> Option<Self> {
        match c {
            'C' => Some(Self::Cups),
            'O' => Some(Self::Coins),
            'E' => Some(Self::Swords),
            'B' => Some(Self::Clubs),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Spanish-deck ranks: numerals 1-7 plus the three face cards
/// (sota, caballo, rey). There are no 8s, 9s, or 10s.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Jack,
    Knight,
    King,
}

impl Rank {
    pub const ALL: [Self; 10] = [
        Self::Ace,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Jack,
        Self::Knight,
        Self::King,
    ];

    /// Single-character wire token for the rank. Note the face tokens:
    /// `S` (sota), `C` (caballo), `R` (rey).
    #[must_use]
    pub const fn token(self) -> char {
        match self {
            Self::Ace => '1',
            Self::Two => '2',
            Self::Three => '3',
            Self::Four => '4',
            Self::Five => '5',
            Self::Six => '6',
            Self::Seven => '7',
            Self::Jack => 'S',
            Self::Knight => 'C',
            Self::King => 'R',
        }
    }

    #[must_use]
    pub const fn from_token(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Ace),
            '2' => Some(Self::Two),
            '3' => Some(Self::Three),
            '4' => Some(Self::Four),
            '5' => Some(Self::Five),
            '6' => Some(Self::Six),
            '7' => Some(Self::Seven),
            'S' => Some(Self::Jack),
            'C' => Some(Self::Knight),
            'R' => Some(Self::King),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// A card is a rank and suit pair. It displays and serializes as the
/// two-character token `<rank><suit>`, e.g. `1O` for the ace of coins or
/// `CB` for the knight of clubs. Rank `C` and suit `C` are distinct and
/// disambiguated by position.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card(pub Rank, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.0.token(), self.1.token())
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid card token {0:?}")]
pub struct ParseCardError(pub String);

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(rank), Some(suit), None) => {
                let rank = Rank::from_token(rank).ok_or_else(|| ParseCardError(s.to_string()))?;
                let suit = Suit::from_token(suit).ok_or_else(|| ParseCardError(s.to_string()))?;
                Ok(Self(rank, suit))
            }
            _ => Err(ParseCardError(s.to_string())),
        }
    }
}

impl Serialize for Card {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum DeckError {
    #[error("requested {requested} cards but only {available} remain")]
    InsufficientCards { requested: usize, available: usize },
    #[error("no cards available to draw")]
    NoCardsAvailable,
}

/// The draw pile. Cards are drawn from the end (the top of the stack).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// All 40 rank and suit combinations exactly once, unshuffled.
    #[must_use]
    pub fn build() -> Self {
        let mut cards = Vec::with_capacity(constants::DECK_SIZE);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card(rank, suit));
            }
        }
        Self { cards }
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    /// Removes `n` cards chosen uniformly at random without replacement.
    /// The deck is left unchanged if it holds fewer than `n` cards.
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        if n > self.cards.len() {
            return Err(DeckError::InsufficientCards {
                requested: n,
                available: self.cards.len(),
            });
        }
        let mut rng = rand::rng();
        let mut dealt = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = rng.random_range(0..self.cards.len());
            dealt.push(self.cards.remove(idx));
        }
        Ok(dealt)
    }

    /// Pops the top card of the draw pile.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Rebuilds the draw pile from the discard pile: the top discard card
    /// stays where it is and the rest are shuffled into the deck. Fails
    /// with `NoCardsAvailable` when the discard pile holds at most one
    /// card, leaving both piles untouched.
    pub fn reshuffle_from_discard(&mut self, discard: &mut Vec<Card>) -> Result<(), DeckError> {
        if discard.len() <= 1 {
            return Err(DeckError::NoCardsAvailable);
        }
        let top = discard.split_off(discard.len() - 1);
        self.cards.append(discard);
        self.cards.shuffle(&mut rand::rng());
        *discard = top;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::build()
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: &str) -> Self {
        let name: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .take(constants::MAX_NAME_LENGTH)
            .collect();
        Self(name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for PlayerName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Shared identifier both players use to address the same room.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_uppercase())
    }

    /// A fresh 6-character uppercase alphanumeric code. Uniqueness is not
    /// guaranteed; the store logs a warning on collisions.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..constants::ROOM_CODE_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..constants::ROOM_CODE_ALPHABET.len());
                constants::ROOM_CODE_ALPHABET[idx] as char
            })
            .collect();
        Self(code)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for RoomCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for RoomCode {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for RoomCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A seated player. The hand holds 3 cards under Classic31 rules and 4
/// under Ventanita; `visibility` mirrors the hand positionally and is
/// empty for Classic31, which plays fully hidden.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub name: PlayerName,
    pub hand: Vec<Card>,
    pub lives: u8,
    pub session_wins: u32,
    pub ventanita_wins: u32,
    pub visibility: Vec<bool>,
}

impl Player {
    #[must_use]
    pub fn new(name: PlayerName) -> Self {
        Self {
            name,
            hand: Vec::new(),
            lives: constants::INITIAL_LIVES,
            session_wins: 0,
            ventanita_wins: 0,
            visibility: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ActionKind {
    DrawDeck,
    DrawDiscard,
    Discard,
    Swap,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::DrawDeck => "drew from the deck",
            Self::DrawDiscard => "drew from the discard",
            Self::Discard => "discarded",
            Self::Swap => "swapped",
        };
        write!(f, "{repr}")
    }
}

/// One observed opponent action. `revealed_card` is `None` only for
/// `DrawDeck`, the one action whose card the opponent cannot see.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub revealed_card: Option<Card>,
    pub at: DateTime<Utc>,
}

/// Bounded per-player history of recent actions, capacity 5 per player.
/// Purely observational: nothing in the rules consults it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionLog(HashMap<PlayerName, Vec<ActionRecord>>);

impl ActionLog {
    pub(crate) fn record(
        &mut self,
        player: &PlayerName,
        kind: ActionKind,
        revealed_card: Option<Card>,
    ) {
        let entries = self.0.entry(player.clone()).or_default();
        entries.push(ActionRecord {
            kind,
            revealed_card,
            at: Utc::now(),
        });
        if entries.len() > constants::ACTION_LOG_CAPACITY {
            entries.remove(0);
        }
    }

    #[must_use]
    pub fn actions_of(&self, player: &PlayerName) -> &[ActionRecord] {
        self.0.get(player).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn last_action_of(&self, player: &PlayerName) -> Option<&ActionRecord> {
        self.0.get(player).and_then(|entries| entries.last())
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}
