use crate::config::QueueMode;

/// Coefficients of the RED probability ramp.
///
/// Always derived from the current thresholds and max_p, never cached across changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    /// `1 / (max_th - min_th)`
    pub v_a: f64,
    /// `-min_th / (max_th - min_th)`
    pub v_b: f64,
    /// `(1 - max_p) / max_th`, gentle region slope
    pub v_c: f64,
    /// `2 * max_p - 1`, gentle region offset
    pub v_d: f64,
}

impl Ramp {
    pub fn new(min_th: f64, max_th: f64, max_p: f64) -> Self {
        let mut th_diff = max_th - min_th;
        if th_diff == 0.0 {
            th_diff = 1.0;
        }
        let (v_c, v_d) = if max_th > 0.0 {
            ((1.0 - max_p) / max_th, 2.0 * max_p - 1.0)
        } else {
            (0.0, 1.0)
        };
        Self {
            v_a: 1.0 / th_diff,
            v_b: -min_th / th_diff,
            v_c,
            v_d,
        }
    }
}

/// Drop probability before count scaling.
///
/// Between the thresholds p climbs from 0 to `max_p`. Above `max_th` it is 1, or in gentle
/// mode it climbs from `max_p` to 1 as the average reaches `2 * max_th`.
pub fn linear_probability(q_avg: f64, min_th: f64, max_th: f64, gentle: bool, max_p: f64) -> f64 {
    let ramp = Ramp::new(min_th, max_th, max_p);

    let p = if gentle && q_avg >= max_th {
        ramp.v_c * q_avg + ramp.v_d
    } else if !gentle && q_avg >= max_th {
        1.0
    } else {
        (ramp.v_a * q_avg + ramp.v_b) * max_p
    };

    p.clamp(0.0, 1.0)
}

/// Spreads drops out by scaling `p` with the number of arrivals since the last drop.
///
/// In wait mode nothing is dropped until `count * p` reaches 1. In byte mode the count is
/// measured in mean-sized packets and the result is scaled by the packet's relative size.
pub fn modify_p(
    p: f64,
    count: u32,
    count_bytes: u64,
    mean_pkt_size: u32,
    wait: bool,
    mode: QueueMode,
    size: u32,
) -> f64 {
    let count = match mode {
        QueueMode::Bytes => count_bytes as f64 / mean_pkt_size as f64,
        QueueMode::Packets => count as f64,
    };
    let np = count * p;

    let mut p = if wait {
        if np < 1.0 {
            0.0
        } else if np < 2.0 {
            p / (2.0 - np)
        } else {
            1.0
        }
    } else if np < 1.0 {
        p / (1.0 - np)
    } else {
        1.0
    };

    if mode == QueueMode::Bytes && p < 1.0 {
        p = p * size as f64 / mean_pkt_size as f64;
    }

    p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ramp_spans_thresholds() {
        let max_p = 1.0 / 50.0;
        assert_eq!(linear_probability(5.0, 5.0, 15.0, false, max_p), 0.0);
        let mid = linear_probability(10.0, 5.0, 15.0, false, max_p);
        assert!((mid - max_p / 2.0).abs() < 1e-12);
        assert_eq!(linear_probability(15.0, 5.0, 15.0, false, max_p), 1.0);
    }

    #[test]
    fn gentle_region_reaches_one_at_twice_max_th() {
        let max_p = 0.1;
        let at_max = linear_probability(15.0, 5.0, 15.0, true, max_p);
        assert!((at_max - max_p).abs() < 1e-12);
        let at_twice = linear_probability(30.0, 5.0, 15.0, true, max_p);
        assert!((at_twice - 1.0).abs() < 1e-12);
    }

    #[test]
    fn equal_thresholds_do_not_divide_by_zero() {
        let p = linear_probability(10.0, 10.0, 10.0, false, 0.1);
        assert!(p.is_finite());
    }

    #[test]
    fn wait_mode_holds_off_until_count_catches_up() {
        assert_eq!(modify_p(0.02, 10, 0, 500, true, QueueMode::Packets, 500), 0.0);
        let p = modify_p(0.02, 75, 0, 500, true, QueueMode::Packets, 500);
        assert!((p - 0.02 / 0.5).abs() < 1e-12);
        assert_eq!(modify_p(0.02, 100, 0, 500, true, QueueMode::Packets, 500), 1.0);
    }

    #[test]
    fn no_wait_grows_with_count() {
        let p = modify_p(0.1, 5, 0, 500, false, QueueMode::Packets, 500);
        assert!((p - 0.2).abs() < 1e-12);
        assert_eq!(modify_p(0.1, 10, 0, 500, false, QueueMode::Packets, 500), 1.0);
    }

    #[test]
    fn byte_mode_scales_by_packet_size() {
        let small = modify_p(0.1, 0, 2500, 500, false, QueueMode::Bytes, 250);
        let large = modify_p(0.1, 0, 2500, 500, false, QueueMode::Bytes, 1000);
        assert!((small - 0.1).abs() < 1e-12);
        assert!((large - 0.4).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn linear_is_monotone_in_average(
            a in 5.0f64..30.0,
            b in 5.0f64..30.0,
            max_p in 0.0f64..1.0,
            gentle in any::<bool>(),
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let p_lo = linear_probability(lo, 5.0, 15.0, gentle, max_p);
            let p_hi = linear_probability(hi, 5.0, 15.0, gentle, max_p);
            prop_assert!(p_lo <= p_hi + 1e-12);
        }

        #[test]
        fn modify_p_saturates(
            p in 0.0f64..=1.0,
            count in 0u32..10_000,
            count_bytes in 0u64..10_000_000,
            wait in any::<bool>(),
            bytes in any::<bool>(),
            size in 1u32..9000,
        ) {
            let mode = if bytes { QueueMode::Bytes } else { QueueMode::Packets };
            let out = modify_p(p, count, count_bytes, 500, wait, mode, size);
            prop_assert!((0.0..=1.0).contains(&out));
        }
    }
}
