//! Command validation against the robot's numeric limits

use crate::{limits, ActionKind, Candidate, Command, CommandError, OriginatorId};
use std::ops::RangeInclusive;

/// Accepted magnitude ranges per action kind
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    /// Drive distance range
    pub drive: RangeInclusive<f64>,
    /// Rotation range in degrees
    pub rotation: RangeInclusive<f64>,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            drive: limits::DRIVE_MIN..=limits::DRIVE_MAX,
            rotation: limits::ROTATION_MIN..=limits::ROTATION_MAX,
        }
    }
}

/// Decides whether a parsed candidate becomes a [`Command`]
#[derive(Debug, Clone, Default)]
pub struct Validator {
    bounds: Bounds,
}

impl Validator {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Whether the candidate satisfies the direction and range rules
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        match candidate.kind() {
            ActionKind::Drive => self.bounds.drive.contains(&candidate.magnitude()),
            ActionKind::Rotate => {
                candidate.direction().is_sideways()
                    && self.bounds.rotation.contains(&candidate.magnitude())
            }
        }
    }

    /// Validate a candidate and attach its originator
    pub fn validate(
        &self,
        candidate: Candidate,
        originator: OriginatorId,
    ) -> Result<Command, CommandError> {
        if !self.accepts(&candidate) {
            return Err(CommandError::Invalid {
                readable: candidate.readable().to_string(),
            });
        }
        Ok(Command::from_candidate(candidate, originator))
    }
}
