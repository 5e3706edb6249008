use std::time::Duration;

/// EWMA of the queue occupancy.
///
/// `idle_arrivals` is the number of packets that would have arrived while the queue sat
/// empty; each of them decays the old average as if a zero-length sample had been taken.
pub fn estimate(n_queued: f64, idle_arrivals: u32, q_avg: f64, q_w: f64) -> f64 {
    let decay = (1.0 - q_w).powf(idle_arrivals as f64 + 1.0);
    q_avg * decay + q_w * n_queued
}

/// Packets the link could have carried during an idle period of `idle_for`.
///
/// With an idle packet size, the packet rate is rescaled from mean-sized packets to
/// idle-sized ones.
pub fn idle_arrivals(ptc: f64, idle_for: Duration, mean_pkt_size: u32, idle_pkt_size: Option<u32>) -> u32 {
    let ptc = match idle_pkt_size {
        Some(idle) => ptc * mean_pkt_size as f64 / idle as f64,
        None => ptc,
    };
    // saturating float to int conversion
    (ptc * idle_for.as_secs_f64()) as u32
}

/// Which max_p adaptation, if any, follows an average update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adaptation {
    Aimd,
    Quantized,
    None,
}

/// AIMD runs once per `interval`. Otherwise the quantized rule runs on every update when
/// enabled. The two never run for the same update.
pub fn adaptation(adapt_max_p: bool, quantized: bool, now: Duration, last_set: Duration, interval: Duration) -> Adaptation {
    if adapt_max_p && now > last_set + interval {
        Adaptation::Aimd
    } else if quantized {
        Adaptation::Quantized
    } else {
        Adaptation::None
    }
}
