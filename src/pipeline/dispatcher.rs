//! Dispatcher - drains the queue and drives the actuator

use super::feedback;
use super::queue::QueueReceiver;
use super::shutdown::Shutdown;
use crate::actuator::Actuator;
use crate::feed::ReplySink;
use anyhow::Result;
use feedbot_shared::{limits, ActionKind, Command, Direction};
use std::sync::Arc;
use tracing::{error, info, warn};

/// One actuator primitive call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    Move { distance: f64, speed: f64 },
    Rotate { degrees: f64, speed: f64 },
}

/// Translate a command into actuator calls.
///
/// Left is a positive rotation and right a negative one, both for turns and
/// for the quarter turn in front of a sideways drive.
pub fn plan(command: &Command) -> Vec<Motion> {
    let value = command.magnitude();
    let speed = value.abs();
    let forward = Motion::Move {
        distance: value,
        speed,
    };
    let quarter_turn = |degrees: f64| Motion::Rotate {
        degrees,
        speed: limits::TURN_DEGREES,
    };

    match (command.kind(), command.direction()) {
        (ActionKind::Drive, Direction::Forward) => vec![forward],
        (ActionKind::Drive, Direction::Back) => vec![Motion::Move {
            distance: -value,
            speed,
        }],
        (ActionKind::Drive, Direction::Left) => vec![quarter_turn(limits::TURN_DEGREES), forward],
        (ActionKind::Drive, Direction::Right) => {
            vec![quarter_turn(-limits::TURN_DEGREES), forward]
        }
        (ActionKind::Rotate, Direction::Left) => vec![Motion::Rotate {
            degrees: value,
            speed,
        }],
        (ActionKind::Rotate, Direction::Right) => vec![Motion::Rotate {
            degrees: -value,
            speed,
        }],
        (ActionKind::Rotate, Direction::Forward | Direction::Back) => Vec::new(),
    }
}

/// Actuation loop state
pub struct Dispatcher {
    actuator: Arc<dyn Actuator>,
    replies: Arc<dyn ReplySink>,
}

impl Dispatcher {
    pub fn new(actuator: Arc<dyn Actuator>, replies: Arc<dyn ReplySink>) -> Self {
        Self { actuator, replies }
    }

    /// Perform queued commands one at a time until the queue closes or
    /// shutdown is triggered
    pub async fn run(self, mut queue: QueueReceiver, mut shutdown: Shutdown) {
        info!("[DISPATCH] Waiting for actions");

        while let Some(command) = queue.dequeue(&mut shutdown).await {
            if let Err(e) = self.perform(&command).await {
                error!(
                    "[DISPATCH] Actuator fault during '{}', dropping it: {:#}",
                    command.readable(),
                    e
                );
            }
        }

        if shutdown.is_triggered() {
            info!("[DISPATCH] Stopped by shutdown");
        } else {
            info!("[DISPATCH] Queue closed, stopped");
        }
    }

    /// Announce a command and run its motions in order.
    ///
    /// The first failing motion aborts the rest of the command.
    pub async fn perform(&self, command: &Command) -> Result<()> {
        feedback::send(
            &*self.replies,
            &feedback::performing(command.readable()),
            command.originator(),
        )
        .await;
        info!("[DISPATCH] Performing action: {}", command.readable());

        let motions = plan(command);
        if motions.is_empty() {
            warn!("[DISPATCH] Nothing to do for '{}'", command.readable());
        }

        for motion in motions {
            match motion {
                Motion::Move { distance, speed } => self.actuator.move_by(distance, speed).await?,
                Motion::Rotate { degrees, speed } => self.actuator.rotate(degrees, speed).await?,
            }
        }
        Ok(())
    }
}
