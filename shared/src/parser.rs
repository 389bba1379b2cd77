//! Action Parser
//!
//! Folds scanned tokens into a candidate command. Three slots are filled in the
//! fixed order kind -> direction -> magnitude; a token that does not fit the
//! slot currently being filled is skipped.

use crate::{scan, ActionKind, Candidate, CommandError, Direction};
use std::collections::HashMap;

/// Keyword sets recognised by the parser, keyed by upper-case word
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    kinds: HashMap<String, ActionKind>,
    directions: HashMap<String, Direction>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let mut vocabulary = Self::empty();
        for word in ["GO", "DRIVE", "MOVE"] {
            vocabulary = vocabulary.with_kind_word(word, ActionKind::Drive);
        }
        for word in ["TURN", "ROTATE", "SPIN"] {
            vocabulary = vocabulary.with_kind_word(word, ActionKind::Rotate);
        }
        vocabulary
            .with_direction_word("FORWARD", Direction::Forward)
            .with_direction_word("BACK", Direction::Back)
            .with_direction_word("LEFT", Direction::Left)
            .with_direction_word("RIGHT", Direction::Right)
    }
}

impl Vocabulary {
    /// A vocabulary that recognises nothing
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
            directions: HashMap::new(),
        }
    }

    /// Add a word that fills the kind slot
    pub fn with_kind_word(mut self, word: &str, kind: ActionKind) -> Self {
        self.kinds.insert(word.to_uppercase(), kind);
        self
    }

    /// Add a word that fills the direction slot
    pub fn with_direction_word(mut self, word: &str, direction: Direction) -> Self {
        self.directions.insert(word.to_uppercase(), direction);
        self
    }

    pub fn kind(&self, token: &str) -> Option<ActionKind> {
        self.kinds.get(token).copied()
    }

    pub fn direction(&self, token: &str) -> Option<Direction> {
        self.directions.get(token).copied()
    }
}

/// Parse a magnitude token. Only finite numbers count.
fn magnitude(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Slot filling progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotState {
    Empty,
    Kind(ActionKind),
    KindDirection(ActionKind, Direction),
    Filled(ActionKind, Direction, f64),
}

impl SlotState {
    /// Offer one token to the next unfilled slot.
    ///
    /// Returns the new state and whether the token was consumed.
    pub fn advance(self, token: &str, vocabulary: &Vocabulary) -> (SlotState, bool) {
        let next = match self {
            SlotState::Empty => vocabulary.kind(token).map(SlotState::Kind),
            SlotState::Kind(kind) => vocabulary
                .direction(token)
                .map(|direction| SlotState::KindDirection(kind, direction)),
            SlotState::KindDirection(kind, direction) => {
                magnitude(token).map(|value| SlotState::Filled(kind, direction, value))
            }
            SlotState::Filled(..) => None,
        };

        match next {
            Some(state) => (state, true),
            None => (self, false),
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, SlotState::Filled(..))
    }
}

/// Turns message text into a [`Candidate`]
#[derive(Debug, Clone, Default)]
pub struct ActionParser {
    vocabulary: Vocabulary,
}

impl ActionParser {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Parse one message. Tokens after the magnitude are ignored.
    pub fn parse(&self, text: &str) -> Result<Candidate, CommandError> {
        let mut state = SlotState::Empty;
        let mut matched: Vec<String> = Vec::with_capacity(3);

        for token in scan(text) {
            let (next, consumed) = state.advance(&token, &self.vocabulary);
            state = next;
            if consumed {
                matched.push(token.to_lowercase());
            }

            if let SlotState::Filled(kind, direction, value) = state {
                return Ok(Candidate::new(kind, direction, value, matched.join(" ")));
            }
        }

        Err(CommandError::Incomplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Candidate, CommandError> {
        ActionParser::default().parse(text)
    }

    #[test]
    fn test_drive_forward() {
        let c = parse("@bot drive forward 40").unwrap();
        assert_eq!(c.kind(), ActionKind::Drive);
        assert_eq!(c.direction(), Direction::Forward);
        assert_eq!(c.magnitude(), 40.0);
        assert_eq!(c.readable(), "drive forward 40");
    }

    #[test]
    fn test_turn_left() {
        let c = parse("TURN LEFT 90").unwrap();
        assert_eq!(c.kind(), ActionKind::Rotate);
        assert_eq!(c.direction(), Direction::Left);
        assert_eq!(c.magnitude(), 90.0);
    }

    #[test]
    fn test_synonyms() {
        assert_eq!(parse("spin right 10").unwrap().kind(), ActionKind::Rotate);
        assert_eq!(parse("move back 5").unwrap().kind(), ActionKind::Drive);
        assert_eq!(parse("go left 5").unwrap().direction(), Direction::Left);
    }

    #[test]
    fn test_turn_forward_still_parses() {
        // Rejection happens in the validator
        let c = parse("turn forward 90").unwrap();
        assert_eq!(c.kind(), ActionKind::Rotate);
        assert_eq!(c.direction(), Direction::Forward);
    }

    #[test]
    fn test_no_slots_is_incomplete() {
        assert_eq!(parse("hello world"), Err(CommandError::Incomplete));
        assert_eq!(parse(""), Err(CommandError::Incomplete));
    }

    #[test]
    fn test_missing_magnitude_is_incomplete() {
        assert_eq!(parse("drive forward fast"), Err(CommandError::Incomplete));
    }

    #[test]
    fn test_slots_fill_in_order_only() {
        // The number and direction arrive before the kind and are skipped
        assert_eq!(parse("40 forward drive"), Err(CommandError::Incomplete));

        let c = parse("40 left please drive 7 right 12").unwrap();
        assert_eq!(c.direction(), Direction::Right);
        assert_eq!(c.magnitude(), 12.0);
        assert_eq!(c.readable(), "drive right 12");
    }

    #[test]
    fn test_filled_slots_are_not_overwritten() {
        let c = parse("drive turn left right 3 4").unwrap();
        assert_eq!(c.kind(), ActionKind::Drive);
        assert_eq!(c.direction(), Direction::Left);
        assert_eq!(c.magnitude(), 3.0);
    }

    #[test]
    fn test_magnitude_literals() {
        assert_eq!(parse("drive back -12.5").unwrap().magnitude(), -12.5);
        assert_eq!(parse("drive back +3").unwrap().magnitude(), 3.0);
        assert_eq!(parse("drive back 1e2").unwrap().magnitude(), 100.0);
        assert_eq!(parse("drive back inf"), Err(CommandError::Incomplete));
        assert_eq!(parse("drive back nan 4").unwrap().magnitude(), 4.0);
    }

    #[test]
    fn test_parse_is_repeatable() {
        let text = "please ROTATE right by 45 degrees";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_slot_state_advance() {
        let vocabulary = Vocabulary::default();
        let (state, consumed) = SlotState::Empty.advance("LEFT", &vocabulary);
        assert_eq!(state, SlotState::Empty);
        assert!(!consumed);

        let (state, consumed) = state.advance("GO", &vocabulary);
        assert_eq!(state, SlotState::Kind(ActionKind::Drive));
        assert!(consumed);

        let (state, _) = state.advance("LEFT", &vocabulary);
        let (state, _) = state.advance("2", &vocabulary);
        assert!(state.is_filled());

        let (after, consumed) = state.advance("3", &vocabulary);
        assert_eq!(after, state);
        assert!(!consumed);
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocabulary = Vocabulary::empty()
            .with_kind_word("roll", ActionKind::Drive)
            .with_direction_word("ahead", Direction::Forward);
        let parser = ActionParser::new(vocabulary);

        let c = parser.parse("roll ahead 3").unwrap();
        assert_eq!(c.kind(), ActionKind::Drive);
        assert_eq!(c.direction(), Direction::Forward);
        assert_eq!(parser.parse("drive forward 3"), Err(CommandError::Incomplete));
    }
}
