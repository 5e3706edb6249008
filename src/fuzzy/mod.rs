//! Trapezoidal fuzzy sets and the Mamdani classifier built on top of them.
//!
//! The classifier maps two crisp inputs, the average queue length (as a fraction of the
//! maximum threshold) and the current max drop probability, to a drop probability.

pub mod classifier;
pub mod rules;

use serde::{Deserialize, Serialize};

pub use classifier::{AqlLabel, MaxPLabel, classify_aql, classify_max_p};
pub use rules::{DropLevel, infer, infer_drop_probability};

/// Edge widths at or below this are treated as vertical in [`MembershipMode::Compat`].
const COMPAT_VERTICAL_EDGE: f64 = 1e-3;

/// How a trapezoid treats inputs on its falling edge and beyond its upper support.
///
/// `Compat` reproduces the classic CSFL-RED membership: the falling edge is computed as
/// `(x - peak2) / (low2 - peak2)` and anything above `low2` has full membership.
/// `Standard` is the textbook trapezoid: the falling edge descends to zero at `low2` and
/// inputs above it have zero membership, except for right-shoulder sets (`peak2 == low2`)
/// which stay saturated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MembershipMode {
    #[default]
    Compat,
    Standard,
}

/// A trapezoid `low1 <= peak1 <= peak2 <= low2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzySet {
    pub name: &'static str,
    pub low1: f64,
    pub peak1: f64,
    pub peak2: f64,
    pub low2: f64,
}

impl FuzzySet {
    pub const fn new(name: &'static str, low1: f64, peak1: f64, peak2: f64, low2: f64) -> Self {
        Self { name, low1, peak1, peak2, low2 }
    }

    fn is_right_shoulder(&self) -> bool {
        self.peak2 == self.low2
    }

    /// Degree in `[0, 1]` to which `x` belongs to this set.
    pub fn membership(&self, x: f64, mode: MembershipMode) -> f64 {
        debug_assert!(self.low1 <= self.peak1 && self.peak1 <= self.peak2 && self.peak2 <= self.low2);

        let degree = if x < self.low1 {
            0.0
        } else if x < self.peak1 {
            if is_vertical(self.low1, self.peak1, mode) {
                1.0
            } else {
                (x - self.low1) / (self.peak1 - self.low1)
            }
        } else if x <= self.peak2 {
            1.0
        } else if x <= self.low2 {
            if is_vertical(self.peak2, self.low2, mode) {
                1.0
            } else {
                match mode {
                    MembershipMode::Compat => (x - self.peak2) / (self.low2 - self.peak2),
                    MembershipMode::Standard => (self.low2 - x) / (self.low2 - self.peak2),
                }
            }
        } else {
            match mode {
                MembershipMode::Compat => 1.0,
                MembershipMode::Standard if self.is_right_shoulder() => 1.0,
                MembershipMode::Standard => 0.0,
            }
        };

        degree.clamp(0.0, 1.0)
    }

    /// Activation-scaled approximate centroid. Used as a defuzzification weight, it is not
    /// the geometric centroid of the clipped trapezoid.
    pub fn centroid(&self, degree: f64) -> f64 {
        (degree * (self.peak1 + self.peak2) + (self.low1 + self.low2) * (2.0 - degree)) / 4.0
    }
}

fn is_vertical(from: f64, to: f64, mode: MembershipMode) -> bool {
    match mode {
        MembershipMode::Compat => (to - from).abs() < COMPAT_VERTICAL_EDGE,
        MembershipMode::Standard => to - from <= f64::EPSILON,
    }
}

/// One `(label, degree)` pair produced during an inference pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activation<L> {
    pub label: L,
    pub degree: f64,
}

impl<L> Activation<L> {
    pub fn new(label: L, degree: f64) -> Self {
        Self { label, degree }
    }
}
