pub mod logger;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One point of a queue time series, together with the thresholds in force at the time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueSample {
    pub time: f64,
    pub qlen: f64,
    pub min_th: f64,
    pub max_th: f64,
}

impl QueueSample {
    pub fn new(time: Duration, qlen: f64, min_th: f64, max_th: f64) -> Self {
        Self {
            time: time.as_secs_f64(),
            qlen,
            min_th,
            max_th,
        }
    }
}

/// Drop counters and time series owned by one queue disc.
///
/// Only the queue disc appends to it; only the operator clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Early probabilistic drops.
    pub unforced_drops: u64,
    /// Drops above the hard threshold or past the queue limit.
    pub forced_drops: u64,
    /// The subset of forced drops caused by the queue limit.
    pub queue_limit_drops: u64,
    pub admitted: u64,
    /// Average queue after each update.
    pub avg_queue: Vec<QueueSample>,
    /// Instantaneous occupancy seen by each arrival.
    pub cur_queue: Vec<QueueSample>,
    /// Target average of the quantized controller at each of its updates.
    pub targets: Vec<QueueSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub arrivals: u64,
    pub admitted: u64,
    pub unforced_drops: u64,
    pub forced_drops: u64,
    pub queue_limit_drops: u64,
    pub drop_rate: f64,
    pub mean_avg_queue: f64,
    pub peak_avg_queue: f64,
}

impl Stats {
    pub fn total_drops(&self) -> u64 {
        self.unforced_drops + self.forced_drops
    }

    pub fn arrivals(&self) -> u64 {
        self.admitted + self.total_drops()
    }

    pub fn summary(&self) -> StatsSummary {
        let arrivals = self.arrivals();
        let drop_rate = if arrivals > 0 {
            self.total_drops() as f64 / arrivals as f64
        } else {
            0.0
        };
        let mean_avg_queue = if self.avg_queue.is_empty() {
            0.0
        } else {
            self.avg_queue.iter().map(|s| s.qlen).sum::<f64>() / self.avg_queue.len() as f64
        };
        let peak_avg_queue = self.avg_queue.iter().map(|s| s.qlen).fold(0.0, f64::max);

        StatsSummary {
            arrivals,
            admitted: self.admitted,
            unforced_drops: self.unforced_drops,
            forced_drops: self.forced_drops,
            queue_limit_drops: self.queue_limit_drops,
            drop_rate,
            mean_avg_queue,
            peak_avg_queue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_empty_stats() {
        let summary = Stats::default().summary();
        assert_eq!(summary.arrivals, 0);
        assert_eq!(summary.drop_rate, 0.0);
        assert_eq!(summary.mean_avg_queue, 0.0);
    }

    #[test]
    fn summary_rates() {
        let stats = Stats {
            unforced_drops: 1,
            forced_drops: 2,
            queue_limit_drops: 1,
            admitted: 7,
            avg_queue: vec![
                QueueSample::new(Duration::ZERO, 2.0, 5.0, 15.0),
                QueueSample::new(Duration::from_secs(1), 4.0, 5.0, 15.0),
            ],
            ..Default::default()
        };
        let summary = stats.summary();
        assert_eq!(summary.arrivals, 10);
        assert!((summary.drop_rate - 0.3).abs() < 1e-12);
        assert_eq!(summary.mean_avg_queue, 3.0);
        assert_eq!(summary.peak_avg_queue, 4.0);
    }
}
