use crate::error::{ConfigError, ConfigResult};
use crate::fuzzy::MembershipMode;
use crate::strategies::DropCurve;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Unit in which thresholds, the queue limit and the average are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    Bytes,
    #[default]
    Packets,
}

impl FromStr for QueueMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bytes" | "queue_mode_bytes" => Ok(Self::Bytes),
            "packets" | "queue_mode_packets" => Ok(Self::Packets),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes => write!(f, "bytes"),
            Self::Packets => write!(f, "packets"),
        }
    }
}

/// Experimental guards against dropping while the instantaneous queue is far below the
/// average. `fraction` below is `(1 - q_w)` raised to the packets that arrive in 50 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cautious {
    #[default]
    None,
    /// Never drop while the queue is below `fraction * q_avg`.
    HoldBelowAverage,
    /// Scale the random draw up by how far the queue is below `fraction * q_avg`.
    DampBelowAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedConfig {
    pub mode: QueueMode,
    /// Average packet size, used by byte-mode count scaling and the idle estimate.
    pub mean_pkt_size: u32,
    /// When set, idle periods are converted to arrivals with this packet size instead.
    pub idle_pkt_size: Option<u32>,
    pub wait: bool,
    pub gentle: bool,
    /// Automatic thresholds and queue weight, with max_p adaptation.
    pub ared: bool,
    pub adapt_max_p: bool,
    pub curve: DropCurve,
    pub membership: MembershipMode,
    pub min_th: f64,
    pub max_th: f64,
    pub queue_limit: u32,
    /// EWMA weight. 0, -1 and -2 select weights derived from the link.
    pub q_w: f64,
    /// Initial max_p is `1 / l_interm`.
    pub l_interm: f64,
    pub target_delay: Duration,
    pub interval: Duration,
    pub top: f64,
    /// 0 selects a bottom derived from the bandwidth-delay product.
    pub bottom: f64,
    pub alpha: f64,
    pub beta: f64,
    /// Quantized controller decrease divisor.
    pub a: f64,
    /// Quantized controller increase factor.
    pub b: f64,
    pub rtt: Duration,
    pub ns1_compat: bool,
    pub link_bandwidth_bps: u64,
    pub link_delay: Duration,
    pub cautious: Cautious,
}

impl Default for RedConfig {
    fn default() -> Self {
        Self {
            mode: QueueMode::Packets,
            mean_pkt_size: 500,
            idle_pkt_size: None,
            wait: true,
            gentle: true,
            ared: false,
            adapt_max_p: false,
            curve: DropCurve::Linear,
            membership: MembershipMode::Compat,
            min_th: 5.0,
            max_th: 15.0,
            queue_limit: 25,
            q_w: 0.002,
            l_interm: 50.0,
            target_delay: Duration::from_millis(5),
            interval: Duration::from_millis(500),
            top: 0.5,
            bottom: 0.0,
            alpha: 0.01,
            beta: 0.9,
            a: 3.0,
            b: 2.0,
            rtt: Duration::from_millis(100),
            ns1_compat: false,
            link_bandwidth_bps: 1_500_000,
            link_delay: Duration::from_millis(20),
            cautious: Cautious::None,
        }
    }
}

impl RedConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self = serde_json::from_str(&data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_th > self.max_th {
            return Err(ConfigError::InvertedThresholds {
                min_th: self.min_th,
                max_th: self.max_th,
            });
        }
        if self.mean_pkt_size == 0 {
            return Err(ConfigError::ZeroMeanPktSize);
        }
        if self.idle_pkt_size == Some(0) {
            return Err(ConfigError::ZeroIdlePktSize);
        }
        if !is_valid_queue_weight(self.q_w) {
            return Err(ConfigError::InvalidQueueWeight(self.q_w));
        }
        for (name, value) in [
            ("top", self.top),
            ("bottom", self.bottom),
            ("alpha", self.alpha),
            ("beta", self.beta),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        for (name, value) in [("a", self.a), ("b", self.b)] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveFactor { name, value });
            }
        }
        if self.bottom > self.top {
            return Err(ConfigError::InvertedBounds {
                bottom: self.bottom,
                top: self.top,
            });
        }
        if !(self.l_interm >= 1.0) {
            return Err(ConfigError::InvalidLInterm(self.l_interm));
        }
        if self.link_bandwidth_bps == 0 {
            return Err(ConfigError::ZeroBandwidth);
        }
        Ok(())
    }

    pub fn with_thresholds(mut self, min_th: f64, max_th: f64) -> Self {
        self.min_th = min_th;
        self.max_th = max_th;
        self
    }

    pub fn with_queue_limit(mut self, limit: u32) -> Self {
        self.queue_limit = limit;
        self
    }

    pub fn with_mode(mut self, mode: QueueMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_curve(mut self, curve: DropCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_membership(mut self, membership: MembershipMode) -> Self {
        self.membership = membership;
        self
    }

    pub fn with_queue_weight(mut self, q_w: f64) -> Self {
        self.q_w = q_w;
        self
    }

    pub fn with_gentle(mut self, gentle: bool) -> Self {
        self.gentle = gentle;
        self
    }

    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_ared(mut self, ared: bool) -> Self {
        self.ared = ared;
        self
    }

    pub fn with_adapt_max_p(mut self, adapt: bool) -> Self {
        self.adapt_max_p = adapt;
        self
    }

    pub fn with_l_interm(mut self, l_interm: f64) -> Self {
        self.l_interm = l_interm;
        self
    }

    pub fn with_idle_pkt_size(mut self, size: u32) -> Self {
        self.idle_pkt_size = Some(size);
        self
    }

    pub fn with_cautious(mut self, cautious: Cautious) -> Self {
        self.cautious = cautious;
        self
    }

    pub fn with_ns1_compat(mut self, compat: bool) -> Self {
        self.ns1_compat = compat;
        self
    }

    pub fn with_link(mut self, bandwidth_bps: u64, delay: Duration) -> Self {
        self.link_bandwidth_bps = bandwidth_bps;
        self.link_delay = delay;
        self
    }

    pub fn with_ared_bounds(mut self, bottom: f64, top: f64) -> Self {
        self.bottom = bottom;
        self.top = top;
        self
    }
}

fn is_valid_queue_weight(q_w: f64) -> bool {
    q_w == 0.0 || q_w == -1.0 || q_w == -2.0 || (q_w > 0.0 && q_w <= 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RedConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = RedConfig::default().with_thresholds(20.0, 10.0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvertedThresholds { .. }));
    }

    #[test]
    fn queue_weight_sentinels() {
        for q_w in [0.0, -1.0, -2.0, 0.5, 1.0] {
            assert!(RedConfig::default().with_queue_weight(q_w).validate().is_ok(), "{q_w}");
        }
        for q_w in [-3.0, 1.5, -0.5] {
            assert_eq!(
                RedConfig::default().with_queue_weight(q_w).validate(),
                Err(ConfigError::InvalidQueueWeight(q_w))
            );
        }
    }

    #[test]
    fn zero_packet_sizes_are_rejected() {
        let mut config = RedConfig::default();
        config.mean_pkt_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroMeanPktSize));

        let config = RedConfig::default().with_idle_pkt_size(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroIdlePktSize));
    }

    #[test]
    fn quantized_factors_must_be_positive() {
        let mut config = RedConfig::default();
        config.a = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveFactor { name: "a", value: 0.0 }));

        let mut config = RedConfig::default();
        config.b = -1.0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveFactor { name: "b", value: -1.0 }));
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("bytes".parse::<QueueMode>(), Ok(QueueMode::Bytes));
        assert_eq!("QUEUE_MODE_PACKETS".parse::<QueueMode>(), Ok(QueueMode::Packets));
        assert!(matches!("frames".parse::<QueueMode>(), Err(ConfigError::UnknownMode(_))));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: RedConfig =
            serde_json::from_str(r#"{ "min_th": 10.0, "max_th": 30.0, "curve": "fuzzy" }"#).unwrap();
        assert_eq!(config.min_th, 10.0);
        assert_eq!(config.curve, DropCurve::Fuzzy);
        assert_eq!(config.queue_limit, 25);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.json");
        std::fs::write(&path, r#"{ "mode": "bytes", "queue_limit": 12500 }"#).unwrap();
        let config = RedConfig::from_json_file(&path).unwrap();
        assert_eq!(config.mode, QueueMode::Bytes);

        std::fs::write(&path, r#"{ "min_th": 9.0, "max_th": 3.0 }"#).unwrap();
        assert!(RedConfig::from_json_file(&path).is_err());
    }
}
