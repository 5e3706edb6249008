//! Adaptation of the ceiling probability `max_p`.
//!
//! Two policies share the same state: the AIMD rule from Adaptive RED, gated by an update
//! interval, and a quantized status-driven rule that reacts whenever the average moves into
//! a different band relative to the thresholds.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Fraction of the threshold span that forms the target band.
const BAND: f64 = 0.4;

/// Where the average sat relative to the thresholds at the last quantized update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    Above,
    Between,
    #[default]
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimdParams {
    pub top: f64,
    pub bottom: f64,
    pub alpha: f64,
    pub beta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizedParams {
    /// Divisor applied when the average falls below `min_th`.
    pub a: f64,
    /// Factor applied when the average overshoots `2 * max_th`.
    pub b: f64,
}

/// Average that the quantized policy steers towards.
pub fn target(min_th: f64, max_th: f64) -> f64 {
    min_th + BAND * (max_th - min_th)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaxPController {
    pub cur_max_p: f64,
    pub last_set: Duration,
    pub status: Status,
}

impl MaxPController {
    pub fn new(cur_max_p: f64) -> Self {
        Self {
            cur_max_p,
            last_set: Duration::ZERO,
            status: Status::Below,
        }
    }

    /// AIMD step. Returns whether `cur_max_p` moved.
    ///
    /// Below the band max_p decays by `beta` so the average can grow; above it max_p grows
    /// by at most a quarter of itself. The result stays within `[bottom, top]`.
    pub fn update_aimd(&mut self, new_avg: f64, now: Duration, min_th: f64, max_th: f64, p: &AimdParams) -> bool {
        let part = BAND * (max_th - min_th);

        if new_avg < min_th + part && self.cur_max_p > p.bottom {
            self.cur_max_p = (self.cur_max_p * p.beta).max(p.bottom);
        } else if new_avg > max_th - part && p.top > self.cur_max_p {
            let alpha = p.alpha.min(0.25 * self.cur_max_p);
            self.cur_max_p = (self.cur_max_p + alpha).min(p.top);
        } else {
            return false;
        }

        self.last_set = now;
        debug!(cur_max_p = self.cur_max_p, new_avg, "aimd max_p update");
        true
    }

    /// Quantized step. Acts only when the average enters a different status band.
    pub fn update_quantized(
        &mut self,
        new_avg: f64,
        now: Duration,
        min_th: f64,
        max_th: f64,
        p: &QuantizedParams,
    ) -> bool {
        let next = if min_th < new_avg && new_avg < max_th {
            Status::Between
        } else if new_avg < min_th {
            Status::Below
        } else if new_avg > max_th {
            Status::Above
        } else {
            return false;
        };

        if next == self.status {
            return false;
        }

        let max_p = self.cur_max_p;
        let updated = match next {
            Status::Between if new_avg < target(min_th, max_th) => 4.0 * max_p.powi(3),
            Status::Between => 2.0 * max_p,
            Status::Below => max_p / p.a,
            Status::Above if new_avg < 2.0 * max_th => 4.0 * max_p.powi(3),
            Status::Above => max_p * p.b,
        };

        self.status = next;
        self.cur_max_p = updated.clamp(0.0, 1.0);
        self.last_set = now;
        debug!(cur_max_p = self.cur_max_p, status = ?next, new_avg, "quantized max_p update");
        true
    }
}
