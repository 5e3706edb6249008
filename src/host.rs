//! Interfaces to the event-driven host that drives a queue disc: its clock and its source
//! of uniform random numbers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Simulated time. Must never go backwards between calls.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Uniform variates in `[0, 1)`.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

/// A clock the host advances by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        debug_assert!(now >= self.now.get(), "clock moved backwards");
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Any `rand` generator as a uniform source.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> UniformSource for RngSource<R> {
    fn next_uniform(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Replays a fixed list of variates, cycling when it runs out.
///
/// An empty sequence yields values just below one, which never drop unless `p` is ~1.
#[derive(Debug, Clone, Default)]
pub struct FixedSequence {
    values: VecDeque<f64>,
}

impl FixedSequence {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// The same value forever.
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }
}

impl UniformSource for FixedSequence {
    fn next_uniform(&mut self) -> f64 {
        match self.values.pop_front() {
            Some(v) => {
                self.values.push_back(v);
                v
            }
            None => 1.0 - f64::EPSILON,
        }
    }
}
