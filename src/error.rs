use thiserror::Error;

/// Problems found while validating a [`RedConfig`](crate::config::RedConfig).
///
/// All of these abort construction; nothing at packet time ever returns one.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("minimum threshold {min_th} is above maximum threshold {max_th}")]
    InvertedThresholds { min_th: f64, max_th: f64 },

    #[error("unknown queue mode '{0}', expected 'bytes' or 'packets'")]
    UnknownMode(String),

    #[error("mean packet size must be positive")]
    ZeroMeanPktSize,

    #[error("idle packet size must be positive when idle compensation is enabled")]
    ZeroIdlePktSize,

    #[error("queue weight {0} is neither in (0, 1] nor one of the sentinels 0, -1, -2")]
    InvalidQueueWeight(f64),

    #[error("{name} must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NonPositiveFactor { name: &'static str, value: f64 },

    #[error("ARED bounds are inverted: bottom {bottom} > top {top}")]
    InvertedBounds { bottom: f64, top: f64 },

    #[error("lInterm must be at least 1, got {0}")]
    InvalidLInterm(f64),

    #[error("link bandwidth must be positive")]
    ZeroBandwidth,

    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
