//! Actuator trait abstraction for pluggable motion backends

use anyhow::Result;
use async_trait::async_trait;

/// A robot body that can drive and turn.
///
/// Both motion calls resolve once the motion has finished. Positive degrees
/// turn counter-clockwise (left), negative degrees turn clockwise (right).
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Human-readable name for this actuator
    fn name(&self) -> &str;

    /// Whether this body has wheels at all
    fn supports_motion(&self) -> bool;

    /// Drive straight by `distance` (negative drives backwards) at `speed`
    async fn move_by(&self, distance: f64, speed: f64) -> Result<()>;

    /// Turn in place by `degrees` at `speed` degrees per second
    async fn rotate(&self, degrees: f64, speed: f64) -> Result<()>;
}
