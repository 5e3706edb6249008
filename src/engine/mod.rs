//! The admission engine: one RED queue disc deciding, per arrival, whether an item enters
//! the backing storage.
//!
//! The engine is driven by a single-threaded host. Every call runs to completion and all
//! controller state is owned by the instance, so nothing here locks.

pub mod estimator;
pub mod params;

pub use params::Params;

use crate::config::{Cautious, QueueMode, RedConfig};
use crate::error::ConfigResult;
use crate::host::{Clock, UniformSource};
use crate::metrics::{QueueSample, Stats};
use crate::network::{Backlog, QueueItem};
use crate::strategies::adaptive::{self, AimdParams, QuantizedParams};
use crate::strategies::{red, CurveParams, DropCurve, MaxPController, Status};
use estimator::Adaptation;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Packets arriving within this window size the cautious-mode fraction.
const CAUTIOUS_WINDOW_SECS: f64 = 0.05;

/// Outcome of one enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    /// Dropped by the hard threshold or the queue limit.
    Forced,
    /// Dropped early by the probability draw.
    Unforced,
}

impl Verdict {
    pub fn is_drop(&self) -> bool {
        !matches!(self, Self::Admit)
    }
}

#[derive(Debug, Clone)]
struct State {
    q_avg: f64,
    /// Arrivals since the last drop.
    count: u32,
    count_bytes: u64,
    /// Whether the average has already been above `min_th` since the last drop.
    old: bool,
    idle: bool,
    idle_time: Duration,
    v_prob: f64,
    controller: MaxPController,
}

impl State {
    fn new(initial_max_p: f64) -> Self {
        Self {
            q_avg: 0.0,
            count: 0,
            count_bytes: 0,
            old: false,
            idle: true,
            idle_time: Duration::ZERO,
            v_prob: 0.0,
            controller: MaxPController::new(initial_max_p),
        }
    }
}

/// RED queue disc over an external backlog, with a linear or fuzzy drop curve and optional
/// AIMD or quantized max_p adaptation.
pub struct RedQueueDisc<P, B, C, R> {
    config: RedConfig,
    params: Params,
    state: State,
    stats: Stats,
    backlog: B,
    clock: C,
    rng: R,
    _item: PhantomData<P>,
}

impl<P, B, C, R> RedQueueDisc<P, B, C, R>
where
    P: QueueItem,
    B: Backlog<P>,
    C: Clock,
    R: UniformSource,
{
    pub fn new(config: RedConfig, backlog: B, clock: C, rng: R) -> ConfigResult<Self> {
        config.validate()?;
        let params = Params::resolve(&config);
        let mut disc = Self {
            state: State::new(params.initial_max_p),
            config,
            params,
            stats: Stats::default(),
            backlog,
            clock,
            rng,
            _item: PhantomData,
        };
        disc.initialize_params();
        info!(
            curve = %disc.config.curve,
            mode = %disc.config.mode,
            min_th = disc.params.min_th,
            max_th = disc.params.max_th,
            "red queue disc ready"
        );
        Ok(disc)
    }

    /// Re-derives the parameters from the configuration and resets the controller state.
    /// Statistics are left alone.
    pub fn initialize_params(&mut self) {
        self.params = Params::resolve(&self.config);
        self.state = State::new(self.params.initial_max_p);
        debug!(params = ?self.params, "initialized red parameters");
    }

    pub fn enqueue(&mut self, item: P) -> Verdict {
        let now = self.clock.now();
        let n_queued = self.occupancy();
        let size = item.size_bytes();

        let mut idle_arrivals = 0;
        if self.state.idle {
            let idle_for = now.saturating_sub(self.state.idle_time);
            idle_arrivals = estimator::idle_arrivals(
                self.params.ptc,
                idle_for,
                self.config.mean_pkt_size,
                self.config.idle_pkt_size,
            );
            self.state.idle = false;
        }

        self.update_average(n_queued as f64, idle_arrivals, now);
        let (min_th, max_th) = (self.params.min_th, self.params.max_th);
        self.stats.avg_queue.push(QueueSample::new(now, self.state.q_avg, min_th, max_th));
        self.stats.cur_queue.push(QueueSample::new(now, n_queued as f64, min_th, max_th));

        self.state.count = self.state.count.saturating_add(1);
        self.state.count_bytes += size as u64;

        let q_avg = self.state.q_avg;
        let mut verdict = Verdict::Admit;
        if q_avg >= min_th && n_queued > 1 {
            let hard = if self.config.gentle { 2.0 * max_th } else { max_th };
            if q_avg >= hard {
                verdict = Verdict::Forced;
            } else if !self.state.old {
                self.state.count = 1;
                self.state.count_bytes = size as u64;
                self.state.old = true;
            } else if self.drop_early(n_queued, size) {
                verdict = Verdict::Unforced;
            }
        } else {
            self.state.v_prob = 0.0;
            self.state.old = false;
        }

        let over_limit = match self.config.mode {
            QueueMode::Packets => n_queued >= self.config.queue_limit as u64,
            QueueMode::Bytes => n_queued + size as u64 > self.config.queue_limit as u64,
        };
        if over_limit {
            verdict = Verdict::Forced;
            self.stats.queue_limit_drops += 1;
        }

        if verdict == Verdict::Admit && self.backlog.push(item).is_err() {
            verdict = Verdict::Forced;
            self.stats.queue_limit_drops += 1;
        }

        match verdict {
            Verdict::Admit => self.stats.admitted += 1,
            Verdict::Unforced => self.stats.unforced_drops += 1,
            Verdict::Forced => {
                self.stats.forced_drops += 1;
                if self.config.ns1_compat {
                    self.state.count = 0;
                    self.state.count_bytes = 0;
                }
            }
        }

        debug!(?verdict, n_queued, q_avg, v_prob = self.state.v_prob, "enqueue");
        verdict
    }

    pub fn dequeue(&mut self) -> Option<P> {
        match self.backlog.pop() {
            Some(item) => {
                self.state.idle = false;
                Some(item)
            }
            None => {
                self.state.idle = true;
                self.state.idle_time = self.clock.now();
                None
            }
        }
    }

    pub fn peek(&self) -> Option<&P> {
        self.backlog.peek()
    }

    /// Occupancy of the backlog in the configured unit.
    pub fn queue_size(&self) -> u64 {
        self.occupancy()
    }

    fn occupancy(&self) -> u64 {
        match self.config.mode {
            QueueMode::Bytes => self.backlog.bytes(),
            QueueMode::Packets => self.backlog.packets() as u64,
        }
    }

    fn update_average(&mut self, n_queued: f64, idle_arrivals: u32, now: Duration) {
        let new_avg = estimator::estimate(n_queued, idle_arrivals, self.state.q_avg, self.params.q_w);
        let (min_th, max_th) = (self.params.min_th, self.params.max_th);
        let quantized = self.config.curve == DropCurve::Fuzzy;

        let adaptation = estimator::adaptation(
            self.params.adapt_max_p,
            quantized,
            now,
            self.state.controller.last_set,
            self.config.interval,
        );
        match adaptation {
            Adaptation::Aimd => {
                let aimd = AimdParams {
                    top: self.params.top,
                    bottom: self.params.bottom,
                    alpha: self.config.alpha,
                    beta: self.config.beta,
                };
                self.state.controller.update_aimd(new_avg, now, min_th, max_th, &aimd);
            }
            Adaptation::Quantized => {
                let target = adaptive::target(min_th, max_th);
                self.stats.targets.push(QueueSample::new(now, target, min_th, max_th));
                let quant = QuantizedParams {
                    a: self.config.a,
                    b: self.config.b,
                };
                self.state.controller.update_quantized(new_avg, now, min_th, max_th, &quant);
            }
            Adaptation::None => {}
        }

        debug_assert!(new_avg >= 0.0, "negative average {new_avg}");
        self.state.q_avg = new_avg.max(0.0);
    }

    fn drop_early(&mut self, n_queued: u64, size: u32) -> bool {
        let curve = CurveParams {
            min_th: self.params.min_th,
            max_th: self.params.max_th,
            gentle: self.config.gentle,
            membership: self.config.membership,
        };
        let p = self.config.curve.probability(self.state.q_avg, self.cur_max_p(), &curve);
        self.state.v_prob = red::modify_p(
            p,
            self.state.count,
            self.state.count_bytes,
            self.config.mean_pkt_size,
            self.config.wait,
            self.config.mode,
            size,
        );

        let floor = self.cautious_fraction() * self.state.q_avg;
        let n_queued = n_queued as f64;
        if self.config.cautious == Cautious::HoldBelowAverage && n_queued < floor {
            return false;
        }

        let mut u = self.rng.next_uniform();
        if self.config.cautious == Cautious::DampBelowAverage && floor > 0.0 {
            let ratio = n_queued / floor;
            if ratio < 1.0 {
                u /= ratio;
            }
        }

        if u <= self.state.v_prob {
            self.state.count = 0;
            self.state.count_bytes = 0;
            return true;
        }
        false
    }

    // (1 - q_w) raised to the packets the link carries in the cautious window
    fn cautious_fraction(&self) -> f64 {
        (1.0 - self.params.q_w).powf(self.params.ptc * CAUTIOUS_WINDOW_SECS)
    }

    pub fn q_avg(&self) -> f64 {
        self.state.q_avg
    }

    pub fn cur_max_p(&self) -> f64 {
        self.state.controller.cur_max_p
    }

    pub fn status(&self) -> Status {
        self.state.controller.status
    }

    /// Arrivals since the last drop, in packets.
    pub fn count(&self) -> u32 {
        self.state.count
    }

    /// Probability used by the most recent early drop decision.
    pub fn v_prob(&self) -> f64 {
        self.state.v_prob
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn config(&self) -> &RedConfig {
        &self.config
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Hands the accumulated statistics to the caller and starts over.
    pub fn take_stats(&mut self) -> Stats {
        std::mem::take(&mut self.stats)
    }

    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    pub fn backlog(&self) -> &B {
        &self.backlog
    }

    pub fn backlog_mut(&mut self) -> &mut B {
        &mut self.backlog
    }

    /// Applies `update` to a copy of the configuration and keeps it only if it validates.
    fn reconfigure(&mut self, update: impl FnOnce(&mut RedConfig)) -> ConfigResult<()> {
        let mut candidate = self.config.clone();
        update(&mut candidate);
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    pub fn set_thresholds(&mut self, min_th: f64, max_th: f64) -> ConfigResult<()> {
        self.reconfigure(|c| {
            c.min_th = min_th;
            c.max_th = max_th;
        })?;
        self.initialize_params();
        Ok(())
    }

    pub fn set_mode(&mut self, mode: QueueMode) {
        self.config.mode = mode;
        self.initialize_params();
    }

    pub fn set_queue_limit(&mut self, limit: u32) {
        self.config.queue_limit = limit;
        self.initialize_params();
    }

    pub fn set_ared_alpha(&mut self, alpha: f64) -> ConfigResult<()> {
        self.reconfigure(|c| c.alpha = alpha)?;
        if alpha > 0.01 {
            warn!(alpha, "ared alpha above 0.01 may cause instability");
        }
        Ok(())
    }

    pub fn set_ared_beta(&mut self, beta: f64) -> ConfigResult<()> {
        self.reconfigure(|c| c.beta = beta)?;
        if beta < 0.83 {
            warn!(beta, "ared beta below 0.83 may cause instability");
        }
        Ok(())
    }

    pub fn set_quantized_a(&mut self, a: f64) -> ConfigResult<()> {
        self.reconfigure(|c| c.a = a)?;
        if a != 3.0 {
            warn!(a, "quantized decrease divisor differs from the recommended 3");
        }
        Ok(())
    }

    pub fn set_quantized_b(&mut self, b: f64) -> ConfigResult<()> {
        self.reconfigure(|c| c.b = b)?;
        if b != 2.0 {
            warn!(b, "quantized increase factor differs from the recommended 2");
        }
        Ok(())
    }
}
