//! Simulated robot body
//!
//! Sleeps for as long as the motion would take and dead-reckons a pose, so the
//! pipeline can be run end to end without hardware.

use super::traits::Actuator;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Simulation settings
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Report a body with wheels
    pub motion_enabled: bool,
    /// Multiplier on simulated motion time (0 = instant)
    pub time_scale: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            motion_enabled: true,
            time_scale: 1.0,
        }
    }
}

/// Dead-reckoned position, heading 0 faces +x, counter-clockwise positive
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,
}

/// Actuator that only pretends to move
pub struct SimulatedActuator {
    config: SimConfig,
    pose: Arc<RwLock<Pose>>,
}

impl SimulatedActuator {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            pose: Arc::new(RwLock::new(Pose::default())),
        }
    }

    /// Get the current pose estimate
    pub async fn pose(&self) -> Pose {
        *self.pose.read().await
    }

    /// How long a motion of `amount` at `speed` takes
    fn duration_for(&self, amount: f64, speed: f64) -> Duration {
        if speed <= 0.0 || self.config.time_scale <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(amount.abs() / speed * self.config.time_scale)
            .unwrap_or(Duration::MAX)
    }
}

fn check_finite(values: &[f64]) -> Result<()> {
    if values.iter().any(|v| !v.is_finite()) {
        bail!("non-finite motion parameters: {:?}", values);
    }
    Ok(())
}

#[async_trait]
impl Actuator for SimulatedActuator {
    fn name(&self) -> &str {
        "simulated robot"
    }

    fn supports_motion(&self) -> bool {
        self.config.motion_enabled
    }

    async fn move_by(&self, distance: f64, speed: f64) -> Result<()> {
        check_finite(&[distance, speed])?;
        info!("[ACTUATOR] Moving {} at speed {}", distance, speed);

        tokio::time::sleep(self.duration_for(distance, speed)).await;

        let mut pose = self.pose.write().await;
        let heading = pose.heading_deg.to_radians();
        pose.x += distance * heading.cos();
        pose.y += distance * heading.sin();
        Ok(())
    }

    async fn rotate(&self, degrees: f64, speed: f64) -> Result<()> {
        check_finite(&[degrees, speed])?;
        info!("[ACTUATOR] Rotating {} deg at speed {}", degrees, speed);

        tokio::time::sleep(self.duration_for(degrees, speed)).await;

        let mut pose = self.pose.write().await;
        pose.heading_deg = (pose.heading_deg + degrees).rem_euclid(360.0);
        Ok(())
    }
}
