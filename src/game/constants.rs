//! Game tunables and fixed catalogs.

/// Number of cards in a Spanish deck (4 suits x 10 ranks, no 8s or 9s).
pub const DECK_SIZE: usize = 40;

/// A room seats exactly two players.
pub const ROOM_CAPACITY: usize = 2;

/// Lives each player starts a Classic31 match with.
pub const INITIAL_LIVES: u8 = 3;

/// Hand size for the Classic31 variant.
pub const CLASSIC31_HAND_SIZE: usize = 3;

/// Hand size for the Ventanita variant.
pub const VENTANITA_HAND_SIZE: usize = 4;

/// Minimum hand score a Classic31 player needs before closing a round.
pub const CLASSIC31_CLOSE_SCORE: u8 = 21;

/// Ventanita round wins needed before the next win converts into a
/// session win and resets everyone's counters.
pub const VENTANITA_MATCH_POINT: u32 = 4;

/// Most recent actions retained per player in the opponent action log.
pub const ACTION_LOG_CAPACITY: usize = 5;

/// Maximum characters kept in a sanitized player name.
pub const MAX_NAME_LENGTH: usize = 16;

/// Characters a generated room code is drawn from.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated room code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Commit retries a manager attempts after the initial try.
pub const DEFAULT_COMMIT_RETRIES: u32 = 3;

/// Public label for a tied round.
pub const TIE_LABEL: &str = "EMPATE";

/// Celebration tokens assigned at round resolution. 26 entries: the
/// letters a-z without `v`, plus `ñ`.
pub const CELEBRATION_CATALOG: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "w", "x", "y", "z", "ñ",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celebration_catalog_has_no_v() {
        assert_eq!(CELEBRATION_CATALOG.len(), 26);
        assert!(!CELEBRATION_CATALOG.contains(&"v"));
        assert!(CELEBRATION_CATALOG.contains(&"ñ"));
    }

    #[test]
    fn test_deck_covers_both_variants() {
        // Two full hands plus the discard seed must always fit.
        assert!(DECK_SIZE > ROOM_CAPACITY * VENTANITA_HAND_SIZE + 1);
        assert!(CLASSIC31_HAND_SIZE < VENTANITA_HAND_SIZE);
    }
}
