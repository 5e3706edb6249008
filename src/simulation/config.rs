use super::traffic::TrafficPattern;
use crate::config::RedConfig;
use crate::strategies::StrategyRegistry;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub name: String,
    /// Preset looked up in the strategy registry.
    pub strategy_name: String,
    pub duration: Duration,
    pub traffic_pattern: TrafficPattern,
    pub packet_size: u32,
    pub seed: u64,
    /// Replaces the preset configuration when set.
    pub red: Option<RedConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "default_sim".to_string(),
            strategy_name: "red".to_string(),
            duration: Duration::from_secs(60),
            traffic_pattern: TrafficPattern::Constant { rate_pps: 450.0 },
            packet_size: 500,
            seed: 42,
            red: None,
        }
    }
}

impl SimConfig {
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy_name = strategy.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_traffic(mut self, pattern: TrafficPattern) -> Self {
        self.traffic_pattern = pattern;
        self
    }

    pub fn with_peak_traffic(mut self, base: f64, peak: f64, duration_s: f64) -> Self {
        self.traffic_pattern = TrafficPattern::PeakTraffic {
            base_rate: base,
            peak_rate: peak,
            peak_duration_s: duration_s,
        };
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_red(mut self, red: RedConfig) -> Self {
        self.red = Some(red);
        self
    }

    /// The queue disc configuration this run uses.
    pub fn resolve_red(&self) -> Result<RedConfig> {
        match &self.red {
            Some(red) => Ok(red.clone()),
            None => StrategyRegistry::global()
                .create(&self.strategy_name)
                .ok_or_else(|| anyhow!("Unknown strategy: {}", self.strategy_name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::DropCurve;

    #[test]
    fn preset_or_override() {
        let config = SimConfig::default().with_strategy("csfl-red");
        assert_eq!(config.resolve_red().unwrap().curve, DropCurve::Fuzzy);

        let config = config.with_red(RedConfig::default().with_queue_limit(99));
        assert_eq!(config.resolve_red().unwrap().queue_limit, 99);

        assert!(SimConfig::default().with_strategy("blue").resolve_red().is_err());
    }
}
