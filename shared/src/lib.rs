//! Feedbot Shared Command Types
//!
//! This crate provides the pure half of the feedbot pipeline: turning free text
//! into validated drive/rotate commands, plus the line codec spoken between the
//! bot and its message feed.

pub mod codec;
pub mod parser;
pub mod scanner;
pub mod validator;

use std::fmt;
use thiserror::Error;

pub use parser::{ActionParser, Vocabulary};
pub use scanner::scan;
pub use validator::{Bounds, Validator};

/// Numeric limits for the robot commands
pub mod limits {
    /// Largest accepted drive distance (either sign)
    pub const DRIVE_MAX: f64 = 100.0;

    /// Smallest accepted drive distance
    pub const DRIVE_MIN: f64 = -100.0;

    /// Largest accepted rotation in degrees
    pub const ROTATION_MAX: f64 = 180.0;

    /// Smallest accepted rotation in degrees
    pub const ROTATION_MIN: f64 = -180.0;

    /// Quarter turn performed before a sideways drive
    pub const TURN_DEGREES: f64 = 90.0;
}

/// What kind of motion a command asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Drive,
    Rotate,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Drive => write!(f, "DRIVE"),
            ActionKind::Rotate => write!(f, "ROTATE"),
        }
    }
}

/// Direction word attached to a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Forward,
    Back,
}

impl Direction {
    /// Whether a rotation in this direction makes sense
    pub fn is_sideways(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "LEFT"),
            Direction::Right => write!(f, "RIGHT"),
            Direction::Forward => write!(f, "FORWARD"),
            Direction::Back => write!(f, "BACK"),
        }
    }
}

/// Opaque id of the message a command came from, used to address replies
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OriginatorId(String);

impl OriginatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OriginatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// All three slots filled by the parser, not yet checked against the bounds
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    kind: ActionKind,
    direction: Direction,
    magnitude: f64,
    readable: String,
}

impl Candidate {
    pub(crate) fn new(
        kind: ActionKind,
        direction: Direction,
        magnitude: f64,
        readable: String,
    ) -> Self {
        Self {
            kind,
            direction,
            magnitude,
            readable,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Lower-cased echo of the matched tokens
    pub fn readable(&self) -> &str {
        &self.readable
    }
}

/// A parsed and validated command.
///
/// Only [`Validator::validate`] can build one, so holding a `Command` means the
/// bounds were checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    kind: ActionKind,
    direction: Direction,
    magnitude: f64,
    originator: OriginatorId,
    readable: String,
}

impl Command {
    pub(crate) fn from_candidate(candidate: Candidate, originator: OriginatorId) -> Self {
        Self {
            kind: candidate.kind,
            direction: candidate.direction,
            magnitude: candidate.magnitude,
            originator,
            readable: candidate.readable,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn originator(&self) -> &OriginatorId {
        &self.originator
    }

    /// Human readable form, for feedback text only
    pub fn readable(&self) -> &str {
        &self.readable
    }
}

/// Per-message outcomes that keep a command from being queued
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("message did not contain an action, direction and value")]
    Incomplete,

    #[error("invalid action: {readable}")]
    Invalid { readable: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sideways() {
        assert!(Direction::Left.is_sideways());
        assert!(Direction::Right.is_sideways());
        assert!(!Direction::Forward.is_sideways());
        assert!(!Direction::Back.is_sideways());
    }

    #[test]
    fn test_command_keeps_candidate_fields() {
        let candidate = Candidate::new(ActionKind::Drive, Direction::Back, 12.5, "go back 12.5".into());
        let cmd = Command::from_candidate(candidate, OriginatorId::new("42"));
        assert_eq!(cmd.kind(), ActionKind::Drive);
        assert_eq!(cmd.direction(), Direction::Back);
        assert_eq!(cmd.magnitude(), 12.5);
        assert_eq!(cmd.originator().as_str(), "42");
        assert_eq!(cmd.readable(), "go back 12.5");
    }

    #[test]
    fn test_error_messages() {
        let err = CommandError::Invalid {
            readable: "drive left 250".into(),
        };
        assert_eq!(err.to_string(), "invalid action: drive left 250");
    }
}
