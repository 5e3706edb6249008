use anyhow::{Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Spacing of packets inside one burst.
const BURST_SPACING: Duration = Duration::from_micros(100);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrafficPattern {
    Constant { rate_pps: f64 },
    Bursty { avg_rate_pps: f64, burst_size: u32 },
    Poisson { lambda: f64 },
    PeakTraffic { base_rate: f64, peak_rate: f64, peak_duration_s: f64 },
}

impl TrafficPattern {
    pub fn validate(&self) -> Result<()> {
        let rates = match self {
            Self::Constant { rate_pps } => vec![*rate_pps],
            Self::Bursty { avg_rate_pps, burst_size } => {
                if *burst_size == 0 {
                    bail!("burst size must be positive");
                }
                vec![*avg_rate_pps]
            }
            Self::Poisson { lambda } => vec![*lambda],
            Self::PeakTraffic { base_rate, peak_rate, .. } => vec![*base_rate, *peak_rate],
        };
        if let Some(rate) = rates.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
            bail!("traffic rate must be positive, got {rate}");
        }
        Ok(())
    }
}

/// Arrival times of one synthetic source.
pub struct ArrivalProcess {
    pattern: TrafficPattern,
    rng: StdRng,
    exp: Option<Exp<f64>>,
    burst_left: u32,
}

impl ArrivalProcess {
    pub fn new(pattern: TrafficPattern, seed: u64) -> Result<Self> {
        pattern.validate()?;
        let exp = match pattern {
            TrafficPattern::Poisson { lambda } => {
                Some(Exp::new(lambda).map_err(|e| anyhow::anyhow!("invalid poisson rate {lambda}: {e}"))?)
            }
            _ => None,
        };
        let burst_left = match pattern {
            TrafficPattern::Bursty { burst_size, .. } => burst_size - 1,
            _ => 0,
        };
        Ok(Self {
            pattern,
            rng: StdRng::seed_from_u64(seed),
            exp,
            burst_left,
        })
    }

    /// Time from an arrival at `now` to the next one.
    pub fn next_gap(&mut self, now: Duration) -> Duration {
        match self.pattern {
            TrafficPattern::Constant { rate_pps } => Duration::from_secs_f64(1.0 / rate_pps),
            TrafficPattern::Bursty { avg_rate_pps, burst_size } => {
                if self.burst_left > 0 {
                    self.burst_left -= 1;
                    return BURST_SPACING;
                }
                self.burst_left = burst_size - 1;
                let period = Duration::from_secs_f64(burst_size as f64 / avg_rate_pps);
                period.saturating_sub(BURST_SPACING * (burst_size - 1)).max(BURST_SPACING)
            }
            TrafficPattern::Poisson { .. } => match &self.exp {
                Some(exp) => Duration::from_secs_f64(exp.sample(&mut self.rng)),
                None => Duration::ZERO,
            },
            TrafficPattern::PeakTraffic { base_rate, peak_rate, peak_duration_s } => {
                let rate = if now.as_secs_f64() < peak_duration_s { peak_rate } else { base_rate };
                Duration::from_secs_f64(1.0 / rate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_spacing() {
        let mut process = ArrivalProcess::new(TrafficPattern::Constant { rate_pps: 100.0 }, 1).unwrap();
        assert_eq!(process.next_gap(Duration::ZERO), Duration::from_millis(10));
    }

    #[test]
    fn bursts_then_pause() {
        let pattern = TrafficPattern::Bursty {
            avg_rate_pps: 100.0,
            burst_size: 4,
        };
        let mut process = ArrivalProcess::new(pattern, 1).unwrap();
        for _ in 0..3 {
            assert_eq!(process.next_gap(Duration::ZERO), BURST_SPACING);
        }
        assert_eq!(process.next_gap(Duration::ZERO), Duration::from_micros(39_700));
        assert_eq!(process.next_gap(Duration::ZERO), BURST_SPACING);
    }

    #[test]
    fn peak_then_base() {
        let pattern = TrafficPattern::PeakTraffic {
            base_rate: 10.0,
            peak_rate: 1000.0,
            peak_duration_s: 1.0,
        };
        let mut process = ArrivalProcess::new(pattern, 1).unwrap();
        assert_eq!(process.next_gap(Duration::from_millis(500)), Duration::from_millis(1));
        assert_eq!(process.next_gap(Duration::from_secs(2)), Duration::from_millis(100));
    }

    #[test]
    fn poisson_is_seeded() {
        let pattern = TrafficPattern::Poisson { lambda: 200.0 };
        let mut a = ArrivalProcess::new(pattern.clone(), 9).unwrap();
        let mut b = ArrivalProcess::new(pattern, 9).unwrap();
        for _ in 0..32 {
            assert_eq!(a.next_gap(Duration::ZERO), b.next_gap(Duration::ZERO));
        }
    }

    #[test]
    fn rejects_bad_rates() {
        assert!(TrafficPattern::Constant { rate_pps: 0.0 }.validate().is_err());
        assert!(TrafficPattern::Poisson { lambda: f64::NAN }.validate().is_err());
        let bursty = TrafficPattern::Bursty {
            avg_rate_pps: 10.0,
            burst_size: 0,
        };
        assert!(ArrivalProcess::new(bursty, 0).is_err());
    }
}
