//! Deterministic single-bottleneck driver: synthetic arrivals into one queue disc drained by
//! one link. Only here to exercise the engine from the CLI and the integration tests.

pub mod config;
pub mod traffic;

pub use config::SimConfig;
pub use traffic::{ArrivalProcess, TrafficPattern};

use crate::engine::RedQueueDisc;
use crate::host::{ManualClock, RngSource};
use crate::metrics::logger::SampleLogger;
use crate::metrics::{Stats, StatsSummary};
use crate::network::{DropTailFifo, Packet, PacketId};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, trace};

type Disc = RedQueueDisc<Packet, DropTailFifo<Packet>, ManualClock, RngSource<StdRng>>;

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub name: String,
    pub strategy: String,
    pub seed: u64,
    pub summary: StatsSummary,
    /// Packets put on the link.
    pub delivered: u64,
    pub throughput_mbps: f64,
    pub mean_delay_ms: f64,
    pub final_q_avg: f64,
    pub final_max_p: f64,
    #[serde(skip)]
    pub stats: Stats,
}

pub struct Simulation {
    config: SimConfig,
    progress: bool,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn run(&self) -> Result<SimReport> {
        let red = self.config.resolve_red()?;
        let bandwidth = red.link_bandwidth_bps;
        info!("Starting simulation: {}", self.config.name);
        info!("Strategy: {}", self.config.strategy_name);
        info!("Duration: {:?}", self.config.duration);

        let clock = ManualClock::new();
        let mut disc: Disc = RedQueueDisc::new(
            red,
            DropTailFifo::unbounded(),
            clock.clone(),
            RngSource::seeded(self.config.seed),
        )?;
        let mut arrivals = ArrivalProcess::new(self.config.traffic_pattern.clone(), self.config.seed.wrapping_add(1))?;

        let pb = self.progress_bar()?;
        let mut link = Link::default();
        let mut next_arrival = Duration::ZERO;
        let mut next_id = 0;

        loop {
            let departure_first = link.busy_until.is_some_and(|t| t <= next_arrival);
            let now = match link.busy_until {
                Some(t) if departure_first => t,
                _ => next_arrival,
            };
            if now > self.config.duration {
                break;
            }
            clock.set(now);

            if departure_first {
                link.busy_until = None;
                // an empty pull here is what marks the queue idle
                link.start(&mut disc, now, bandwidth);
            } else {
                let id = PacketId::new(next_id);
                next_id += 1;
                let verdict = disc.enqueue(Packet::new(id, self.config.packet_size, now));
                if verdict.is_drop() {
                    trace!(id = id.value(), ?verdict, "packet dropped");
                }
                next_arrival = now + arrivals.next_gap(now);
                if link.busy_until.is_none() && disc.peek().is_some() {
                    link.start(&mut disc, now, bandwidth);
                }
            }

            if pb.position() < now.as_secs() {
                pb.set_position(now.as_secs());
                let summary = disc.stats().summary();
                pb.set_message(format!(
                    "Loss: {:.2}% | Qavg: {:.2}",
                    summary.drop_rate * 100.0,
                    disc.q_avg()
                ));
            }
        }
        pb.finish_with_message("Simulation complete");

        let stats = disc.take_stats();
        let secs = self.config.duration.as_secs_f64();
        let report = SimReport {
            name: self.config.name.clone(),
            strategy: self.config.strategy_name.clone(),
            seed: self.config.seed,
            summary: stats.summary(),
            delivered: link.delivered,
            throughput_mbps: if secs > 0.0 {
                link.delivered_bytes as f64 * 8.0 / secs / 1e6
            } else {
                0.0
            },
            mean_delay_ms: if link.delivered > 0 {
                link.total_delay.as_secs_f64() * 1000.0 / link.delivered as f64
            } else {
                0.0
            },
            final_q_avg: disc.q_avg(),
            final_max_p: disc.cur_max_p(),
            stats,
        };
        info!(
            "Loss: {:.2}% | Throughput: {:.3} Mbps | Delay: {:.2} ms",
            report.summary.drop_rate * 100.0,
            report.throughput_mbps,
            report.mean_delay_ms
        );
        Ok(report)
    }

    fn progress_bar(&self) -> Result<ProgressBar> {
        if !self.progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(self.config.duration.as_secs());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len}s {msg}")?
                .progress_chars("█▓░"),
        );
        Ok(pb)
    }

    /// Writes the sample series as CSV and the report as JSON under `dir`, returning the JSON
    /// path.
    pub fn save_results(&self, report: &SimReport, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        std::fs::create_dir_all(dir)?;

        for (series, samples) in [
            ("avg", &report.stats.avg_queue),
            ("cur", &report.stats.cur_queue),
            ("target", &report.stats.targets),
        ] {
            if samples.is_empty() {
                continue;
            }
            let csv_path = dir.join(format!("{}_{}_{}.csv", self.config.name, timestamp, series));
            SampleLogger::new(&csv_path)?.log_batch(samples)?;
            info!("Samples saved to: {}", csv_path.display());
        }

        let json_path = dir.join(format!("{}_{}_summary.json", self.config.name, timestamp));
        std::fs::write(&json_path, serde_json::to_string_pretty(report)?)?;
        info!("Summary saved to: {}", json_path.display());
        Ok(json_path)
    }
}

/// The bottleneck link. Transmits one packet at a time at the configured bandwidth.
#[derive(Debug, Default)]
struct Link {
    busy_until: Option<Duration>,
    delivered: u64,
    delivered_bytes: u64,
    total_delay: Duration,
}

impl Link {
    fn start(&mut self, disc: &mut Disc, now: Duration, bandwidth_bps: u64) {
        if let Some(packet) = disc.dequeue() {
            let tx = Duration::from_secs_f64(packet.size as f64 * 8.0 / bandwidth_bps as f64);
            self.busy_until = Some(now + tx);
            self.delivered += 1;
            self.delivered_bytes += packet.size as u64;
            self.total_delay += packet.sojourn_time(now) + tx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(strategy: &str) -> SimConfig {
        SimConfig::default()
            .with_strategy(strategy)
            .with_name(strategy)
            .with_duration(Duration::from_secs(5))
    }

    #[test]
    fn same_seed_same_report() {
        let a = Simulation::new(short("red")).run().unwrap();
        let b = Simulation::new(short("red")).run().unwrap();
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.delivered, b.delivered);
    }

    #[test]
    fn overload_drops_and_link_stays_busy() {
        // 450 pkt/s into a 375 pkt/s link
        let report = Simulation::new(short("red")).run().unwrap();
        assert!(report.summary.unforced_drops + report.summary.forced_drops > 0);
        assert!(report.throughput_mbps > 1.3 && report.throughput_mbps < 1.6);
    }

    #[test]
    fn underload_admits_everything() {
        let config = short("red").with_traffic(TrafficPattern::Constant { rate_pps: 100.0 });
        let report = Simulation::new(config).run().unwrap();
        assert_eq!(report.summary.arrivals, report.summary.admitted);
        assert!(report.final_q_avg < 1.0);
    }

    #[test]
    fn saves_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let sim = Simulation::new(short("csfl-red").with_duration(Duration::from_secs(1)));
        let report = sim.run().unwrap();
        let json = sim.save_results(&report, dir.path()).unwrap();
        let text = std::fs::read_to_string(json).unwrap();
        assert!(text.contains("\"strategy\": \"csfl-red\""));
        let csv_count = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "csv"))
            .count();
        assert!(csv_count >= 2);
    }
}
