//! Rate computation between two samples.
//!
//! A counter that goes backwards is treated as a reset (FLUSH STATUS or a
//! wrapped value): its delta is unknown, so its rate is reported as zero.
//! A smaller `Uptime` means the server restarted between samples and every
//! counter is treated as reset.

use crate::models::{Counters, RateFrame, Sample};

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute u64 delta, returning `None` on counter regression (reset).
pub fn du64(curr: u64, prev: u64) -> Option<u64> {
    curr.checked_sub(prev)
}

/// Per-second rate of a counter, zero on reset or an empty interval.
pub fn rate(curr: u64, prev: u64, elapsed_secs: f64) -> f64 {
    match du64(curr, prev) {
        Some(d) if elapsed_secs > 0.0 => d as f64 / elapsed_secs,
        _ => 0.0,
    }
}

/// Whether the server restarted between two samples.
pub fn server_restarted(prev: &Sample, curr: &Sample) -> bool {
    curr.status.uptime_secs < prev.status.uptime_secs
}

// ---------------------------------------------------------------------------
// Frame computation
// ---------------------------------------------------------------------------

/// Builds the rate frame for `curr` against the previous sample.
pub fn compute(prev: &Sample, curr: &Sample) -> RateFrame {
    let elapsed_secs = curr
        .taken_at
        .saturating_duration_since(prev.taken_at)
        .as_secs_f64();
    let restarted = server_restarted(prev, curr);
    let (c, p) = (curr.status.counters, prev.status.counters);
    let r = |pick: fn(&Counters) -> u64| {
        if restarted {
            0.0
        } else {
            rate(pick(&c), pick(&p), elapsed_secs)
        }
    };

    RateFrame {
        elapsed_secs,
        selects: r(|x| x.selects),
        inserts: r(|x| x.inserts),
        updates: r(|x| x.updates),
        deletes: r(|x| x.deletes),
        queries: r(|x| x.queries),
        previous: prev.clone(),
    }
}
