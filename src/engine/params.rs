use crate::config::{QueueMode, RedConfig};
use serde::Serialize;
use std::time::Duration;

/// Floor for the automatic minimum threshold, in packets.
const MIN_AUTO_MIN_TH: f64 = 5.0;
/// Default RTT assumed by the `-1` queue weight sentinel.
const MIN_WEIGHT_RTT: f64 = 0.1;
/// Ceiling for the automatic ARED bottom.
const MAX_AUTO_BOTTOM: f64 = 0.01;

/// Values derived from a [`RedConfig`] by `initialize_params`.
///
/// Bandwidth-dependent values are fixed at initialization; they do not follow later link
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Params {
    pub min_th: f64,
    pub max_th: f64,
    pub q_w: f64,
    pub top: f64,
    pub bottom: f64,
    /// Link capacity in mean-sized packets per second.
    pub ptc: f64,
    pub adapt_max_p: bool,
    pub initial_max_p: f64,
}

impl Params {
    pub fn resolve(config: &RedConfig) -> Self {
        let ptc = config.link_bandwidth_bps as f64 / (8.0 * config.mean_pkt_size as f64);

        let (mut min_th, mut max_th, mut q_w) = (config.min_th, config.max_th, config.q_w);
        let mut adapt_max_p = config.adapt_max_p;
        if config.ared {
            min_th = 0.0;
            max_th = 0.0;
            q_w = 0.0;
            adapt_max_p = true;
        }

        if min_th == 0.0 && max_th == 0.0 {
            (min_th, max_th) = auto_thresholds(config, ptc);
        }

        Self {
            min_th,
            max_th,
            q_w: resolve_queue_weight(q_w, ptc, config.link_delay),
            top: config.top,
            bottom: resolve_bottom(config),
            ptc,
            adapt_max_p,
            initial_max_p: 1.0 / config.l_interm,
        }
    }
}

// min_th = max(5, target_queue / 2), max_th = 3 * min_th, after Floyd's Adaptive RED
fn auto_thresholds(config: &RedConfig, ptc: f64) -> (f64, f64) {
    let target_queue = config.target_delay.as_secs_f64() * ptc;
    let mut min_th = MIN_AUTO_MIN_TH.max(target_queue / 2.0);
    if config.mode == QueueMode::Bytes {
        min_th *= config.mean_pkt_size as f64;
    }
    (min_th, 3.0 * min_th)
}

fn resolve_queue_weight(q_w: f64, ptc: f64, link_delay: Duration) -> f64 {
    if q_w == 0.0 {
        1.0 - (-1.0 / ptc).exp()
    } else if q_w == -1.0 {
        let rtt = (3.0 * (link_delay.as_secs_f64() + 1.0 / ptc)).max(MIN_WEIGHT_RTT);
        1.0 - (-1.0 / (10.0 * rtt * ptc)).exp()
    } else if q_w == -2.0 {
        1.0 - (-10.0 / ptc).exp()
    } else {
        q_w
    }
}

// At most 1/W, W being the bandwidth-delay product in packets.
fn resolve_bottom(config: &RedConfig) -> f64 {
    if config.bottom != 0.0 {
        return config.bottom;
    }
    let bdp_bottom =
        8.0 * config.mean_pkt_size as f64 * config.rtt.as_secs_f64() / config.link_bandwidth_bps as f64;
    MAX_AUTO_BOTTOM.min(bdp_bottom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_pass_through() {
        let params = Params::resolve(&RedConfig::default());
        assert_eq!(params.min_th, 5.0);
        assert_eq!(params.max_th, 15.0);
        assert_eq!(params.q_w, 0.002);
        assert_eq!(params.initial_max_p, 1.0 / 50.0);
        // 1.5 Mbps of 500 byte packets
        assert!((params.ptc - 375.0).abs() < 1e-9);
        assert!(!params.adapt_max_p);
    }

    #[test]
    fn ared_selects_automatic_settings() {
        let params = Params::resolve(&RedConfig::default().with_ared(true));
        assert!(params.adapt_max_p);
        // target queue is 0.005 s * 375 pkt/s, below the floor of 5
        assert_eq!(params.min_th, 5.0);
        assert_eq!(params.max_th, 15.0);
        assert!((params.q_w - (1.0 - (-1.0f64 / 375.0).exp())).abs() < 1e-15);
    }

    #[test]
    fn automatic_thresholds_follow_fast_links() {
        let config = RedConfig::default()
            .with_thresholds(0.0, 0.0)
            .with_link(100_000_000, Duration::from_millis(1))
            .with_mode(QueueMode::Bytes);
        let params = Params::resolve(&config);
        // 25000 pkt/s * 5 ms / 2 = 62.5 packets, scaled to bytes
        assert!((params.min_th - 62.5 * 500.0).abs() < 1e-6);
        assert!((params.max_th - 3.0 * params.min_th).abs() < 1e-6);
    }

    #[test]
    fn queue_weight_sentinels() {
        let ptc = 375.0;
        let fast = resolve_queue_weight(-2.0, ptc, Duration::ZERO);
        let base = resolve_queue_weight(0.0, ptc, Duration::ZERO);
        assert!(fast > base);

        // short links fall back to the 100 ms default RTT, which matches the base weight here
        let short = resolve_queue_weight(-1.0, ptc, Duration::from_millis(20));
        assert!((short - base).abs() < 1e-15);

        let long = resolve_queue_weight(-1.0, ptc, Duration::from_millis(100));
        let rtt = 3.0 * (0.1 + 1.0 / ptc);
        assert!((long - (1.0 - (-1.0 / (10.0 * rtt * ptc)).exp())).abs() < 1e-15);
        assert!(long < base);
    }

    #[test]
    fn automatic_bottom() {
        let params = Params::resolve(&RedConfig::default());
        // 8 * 500 * 0.1 / 1.5e6 is well below 0.01
        assert!((params.bottom - 4000.0 * 0.1 / 1_500_000.0).abs() < 1e-15);

        let slow_link = RedConfig::default().with_link(10_000, Duration::from_millis(20));
        assert_eq!(Params::resolve(&slow_link).bottom, MAX_AUTO_BOTTOM);

        let explicit = RedConfig::default().with_ared_bounds(0.05, 0.5);
        assert_eq!(Params::resolve(&explicit).bottom, 0.05);
    }
}
