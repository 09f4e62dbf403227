//! Console configuration.

use std::time::Duration;

/// Picoseconds per second (performance_schema timer unit).
pub const PICOS_PER_SEC: u64 = 1_000_000_000_000;

/// Sampler period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Deadline for drill-down fetches, except `EXPLAIN ANALYZE` without timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the key reader blocks before re-checking cancellation.
pub const DEFAULT_KEY_POLL: Duration = Duration::from_millis(250);

/// Number of QPS points kept for the sparkline.
pub const DEFAULT_SPARK_HISTORY: usize = 120;

/// Statement latency thresholds used to colour session rows.
///
/// Values are picoseconds, the unit of the session list sort key. A row is
/// assigned the highest band whose threshold it strictly exceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyBands {
    pub critical: u64,
    pub warning: u64,
    pub notice: u64,
    pub info: u64,
}

impl Default for LatencyBands {
    fn default() -> Self {
        Self {
            critical: 60 * PICOS_PER_SEC,
            warning: 30 * PICOS_PER_SEC,
            notice: 10 * PICOS_PER_SEC,
            info: 5 * PICOS_PER_SEC,
        }
    }
}

/// Severity band of a session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LatencyBand {
    Normal,
    Info,
    Notice,
    Warning,
    Critical,
}

impl LatencyBands {
    pub fn classify(&self, picos: u64) -> LatencyBand {
        if picos > self.critical {
            LatencyBand::Critical
        } else if picos > self.warning {
            LatencyBand::Warning
        } else if picos > self.notice {
            LatencyBand::Notice
        } else if picos > self.info {
            LatencyBand::Info
        } else {
            LatencyBand::Normal
        }
    }
}

/// Runtime settings of the live console.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub tick_interval: Duration,
    pub fetch_timeout: Duration,
    pub key_poll: Duration,
    pub latency_bands: LatencyBands,
    pub spark_history: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            key_poll: DEFAULT_KEY_POLL,
            latency_bands: LatencyBands::default(),
            spark_history: DEFAULT_SPARK_HISTORY,
        }
    }
}
