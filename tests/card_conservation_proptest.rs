//! Property-based tests over randomly generated play sequences.
//!
//! These tests verify that no sequence of legal or illegal calls can
//! ever lose, duplicate, or invent a card, and that every rejected call
//! leaves the room exactly as it found it.

use std::collections::BTreeSet;

use baraja::{
    Card, Classic31, Decision, GameVariant, PlayerName, Rank, Room, RoomCode, RoomError, Suit,
    VariantRules, Ventanita, constants,
};
use proptest::prelude::*;

/// One step a client might take, legal or not, always issued as the
/// current turn holder.
#[derive(Clone, Copy, Debug)]
enum Op {
    DrawDeck,
    DrawDiscard,
    Keep,
    Swap(usize),
    Close,
    StartNew,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::DrawDeck),
        2 => Just(Op::DrawDiscard),
        3 => Just(Op::Keep),
        3 => (0usize..4).prop_map(Op::Swap),
        1 => Just(Op::Close),
        1 => Just(Op::StartNew),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..80)
}

fn variant_strategy() -> impl Strategy<Value = GameVariant> {
    prop_oneof![
        Just(GameVariant::from(Classic31)),
        Just(GameVariant::from(Ventanita)),
    ]
}

// Strategy to generate a valid Spanish-deck card
fn card_strategy() -> impl Strategy<Value = Card> {
    (0usize..Rank::ALL.len(), 0usize..Suit::ALL.len())
        .prop_map(|(rank, suit)| Card(Rank::ALL[rank], Suit::ALL[suit]))
}

// Strategy to generate a hand of unique cards
fn hand_strategy(size: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), size..=size).prop_filter(
        "cards must be unique",
        |cards| {
            let set: BTreeSet<_> = cards.iter().collect();
            set.len() == cards.len()
        },
    )
}

/// Apply one op the way a session would: draws only with an empty
/// staging slot, decisions only with a full one. The slot survives a
/// rejected decision.
fn apply(room: &mut Room, staged: &mut Option<Card>, op: Op) -> Result<(), RoomError> {
    let turn = room.turn.clone();
    match op {
        Op::DrawDeck => {
            if staged.is_none() {
                *staged = Some(room.draw_from_deck(&turn)?);
            }
        }
        Op::DrawDiscard => {
            if staged.is_none() {
                *staged = Some(room.draw_from_discard(&turn)?);
            }
        }
        Op::Keep => {
            if let Some(card) = *staged {
                room.decide(&turn, card, Decision::Keep)?;
                *staged = None;
            }
        }
        Op::Swap(idx) => {
            if let Some(card) = *staged {
                room.decide(&turn, card, Decision::Swap(idx))?;
                *staged = None;
            }
        }
        Op::Close => {
            if staged.is_none() {
                room.close_round(&turn)?;
            }
        }
        Op::StartNew => {
            if staged.is_none() {
                room.start_new_round()?;
            }
        }
    }
    Ok(())
}

/// Every card in the committed document, as wire tokens.
fn committed_tokens(room: &Room) -> Vec<String> {
    let doc = serde_json::to_value(room).expect("room should serialize");
    let card_strings = |value: &serde_json::Value| -> Vec<String> {
        value
            .as_array()
            .expect("expected a card array")
            .iter()
            .map(|card| card.as_str().expect("cards serialize as tokens").to_string())
            .collect()
    };
    let mut tokens = card_strings(&doc["deck"]);
    tokens.extend(card_strings(&doc["discard_pile"]));
    for player in doc["players"].as_array().expect("players array") {
        tokens.extend(card_strings(&player["hand"]));
    }
    tokens
}

proptest! {
    #[test]
    fn test_random_play_conserves_the_deck(
        variant in variant_strategy(),
        ops in ops_strategy(),
    ) {
        let mut room = Room::create(
            RoomCode::new("PROP01"),
            PlayerName::new("ana"),
            variant,
        )
        .unwrap();
        room.seat_guest(PlayerName::new("ben")).unwrap();
        let mut staged: Option<Card> = None;

        for op in ops {
            let before = room.clone();
            let staged_before = staged;
            if apply(&mut room, &mut staged, op).is_err() {
                prop_assert_eq!(&before, &room, "a rejected op must leave the room untouched");
                prop_assert_eq!(staged_before, staged, "a rejected op must not touch the slot");
            }

            let mut tokens = committed_tokens(&room);
            if let Some(card) = staged {
                tokens.push(card.to_string());
            }
            prop_assert_eq!(tokens.len(), constants::DECK_SIZE, "a card went missing");
            let unique: BTreeSet<&String> = tokens.iter().collect();
            prop_assert_eq!(unique.len(), constants::DECK_SIZE, "a card was duplicated");
        }
    }

    #[test]
    fn test_classic31_scores_stay_in_range(hand in hand_strategy(3)) {
        // Best possible suit: ace (11) plus two face cards (10 each).
        prop_assert!(Classic31.score(&hand) <= 31);
    }

    #[test]
    fn test_ventanita_scores_stay_in_range(hand in hand_strategy(4)) {
        // Worst possible hand: four knights or kings at 10 points each.
        prop_assert!(Ventanita.score(&hand) <= 40);
    }

    #[test]
    fn test_score_comparison_is_antisymmetric(
        first in hand_strategy(4),
        second in hand_strategy(4),
    ) {
        let (a, b) = (Classic31.score(&first[..3]), Classic31.score(&second[..3]));
        prop_assert_eq!(
            Classic31.compare_scores(a, b),
            Classic31.compare_scores(b, a).reverse()
        );
        let (a, b) = (Ventanita.score(&first), Ventanita.score(&second));
        prop_assert_eq!(
            Ventanita.compare_scores(a, b),
            Ventanita.compare_scores(b, a).reverse()
        );
    }
}
