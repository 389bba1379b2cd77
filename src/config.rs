//! Bot configuration
//!
//! Built once at start-up from defaults plus `FEEDBOT_*` environment variables,
//! then handed to the components that need it.

use crate::actuator::SimConfig;
use crate::feed::TcpFeedConfig;
use crate::pipeline::{PipelineConfig, QueuePolicy};
use anyhow::{bail, Context, Result};

/// Complete configuration for one running bot
#[derive(Debug, Clone, Default)]
pub struct BotConfig {
    /// Feed server connection
    pub feed: TcpFeedConfig,
    /// Filter, queue policy, vocabulary and bounds
    pub pipeline: PipelineConfig,
    /// Simulated robot settings
    pub actuator: SimConfig,
}

impl BotConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(address) = lookup("FEEDBOT_FEED_ADDR") {
            config.feed.address = address;
        }
        if let Some(token) = lookup("FEEDBOT_TOKEN") {
            config.feed.token = token;
        }
        if let Some(accounts) = lookup("FEEDBOT_ACCOUNTS") {
            config.pipeline.filter.accounts = comma_list(&accounts);
        }
        if let Some(languages) = lookup("FEEDBOT_LANGUAGES") {
            config.pipeline.filter.languages = comma_list(&languages);
        }
        if let Some(capacity) = lookup("FEEDBOT_QUEUE_CAPACITY") {
            let capacity: usize = capacity
                .trim()
                .parse()
                .with_context(|| format!("FEEDBOT_QUEUE_CAPACITY={:?}", capacity))?;
            if capacity == 0 {
                bail!("FEEDBOT_QUEUE_CAPACITY must be at least 1");
            }
            config.pipeline.queue = QueuePolicy::Bounded { capacity };
        }
        if let Some(scale) = lookup("FEEDBOT_SIM_TIME_SCALE") {
            let scale: f64 = scale
                .trim()
                .parse()
                .with_context(|| format!("FEEDBOT_SIM_TIME_SCALE={:?}", scale))?;
            if !scale.is_finite() || scale < 0.0 {
                bail!("FEEDBOT_SIM_TIME_SCALE must be a non-negative number");
            }
            config.actuator.time_scale = scale;
        }
        if let Some(motion) = lookup("FEEDBOT_SIM_MOTION") {
            config.actuator.motion_enabled = motion
                .trim()
                .parse()
                .with_context(|| format!("FEEDBOT_SIM_MOTION={:?}", motion))?;
        }

        Ok(config)
    }
}

fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<BotConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.feed.address, "127.0.0.1:8080");
        assert_eq!(config.pipeline.queue, QueuePolicy::Unbounded);
        assert_eq!(config.pipeline.filter.languages, vec!["en"]);
        assert!(config.pipeline.filter.accounts.is_empty());
        assert!(config.actuator.motion_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("FEEDBOT_FEED_ADDR", "10.0.0.5:9000"),
            ("FEEDBOT_ACCOUNTS", "robot_one, robot_two,"),
            ("FEEDBOT_LANGUAGES", "en,fr"),
            ("FEEDBOT_QUEUE_CAPACITY", "16"),
            ("FEEDBOT_SIM_TIME_SCALE", "0.25"),
            ("FEEDBOT_SIM_MOTION", "false"),
        ])
        .unwrap();

        assert_eq!(config.feed.address, "10.0.0.5:9000");
        assert_eq!(config.pipeline.filter.accounts, vec!["robot_one", "robot_two"]);
        assert_eq!(config.pipeline.filter.languages, vec!["en", "fr"]);
        assert_eq!(config.pipeline.queue, QueuePolicy::Bounded { capacity: 16 });
        assert_eq!(config.actuator.time_scale, 0.25);
        assert!(!config.actuator.motion_enabled);
    }

    #[test]
    fn test_bad_values() {
        assert!(config_from(&[("FEEDBOT_QUEUE_CAPACITY", "lots")]).is_err());
        assert!(config_from(&[("FEEDBOT_QUEUE_CAPACITY", "0")]).is_err());
        assert!(config_from(&[("FEEDBOT_SIM_TIME_SCALE", "-1")]).is_err());
        assert!(config_from(&[("FEEDBOT_SIM_MOTION", "maybe")]).is_err());
    }
}
