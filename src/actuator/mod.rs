//! Motion collaborators
//!
//! The dispatcher only sees the [`Actuator`] trait; `SimulatedActuator` is the
//! backend used when no robot is attached.

mod simulated;
mod traits;

pub use simulated::{SimConfig, SimulatedActuator};
pub use traits::Actuator;
