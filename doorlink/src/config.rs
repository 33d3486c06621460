//! Controller configuration

use std::time::Duration;

use doorlink_core::constants::{
    DEFAULT_HEARTBEAT_PERIOD, DEFAULT_IDLE_QUANTUM, DEFAULT_QUIET_INTERVAL, DEFAULT_READ_TIMEOUT,
    DEFAULT_SETTLE_PERIOD,
};

/// Timing knobs for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Bound on a single frame read
    pub read_timeout: Duration,

    /// Heartbeat period; the schedule never drifts
    pub heartbeat_period: Duration,

    /// Sleep between idle ticks
    pub idle_quantum: Duration,

    /// Wait after the link reset marker
    pub settle_period: Duration,

    /// Silence that counts as a quiet link
    pub quiet_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
            idle_quantum: DEFAULT_IDLE_QUANTUM,
            settle_period: DEFAULT_SETTLE_PERIOD,
            quiet_interval: DEFAULT_QUIET_INTERVAL,
        }
    }
}

impl ControllerConfig {
    /// Set read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set heartbeat period
    pub fn with_heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = period;
        self
    }

    /// Set idle sleep between ticks
    pub fn with_idle_quantum(mut self, quantum: Duration) -> Self {
        self.idle_quantum = quantum;
        self
    }

    /// Set the post-reset settle period
    pub fn with_settle_period(mut self, period: Duration) -> Self {
        self.settle_period = period;
        self
    }

    /// Set the quiet interval
    pub fn with_quiet_interval(mut self, interval: Duration) -> Self {
        self.quiet_interval = interval;
        self
    }
}
