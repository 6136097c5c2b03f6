//! Engine configuration.

use crate::sla::status::DEFAULT_AT_RISK_THRESHOLD_PCT;
use std::time::Duration;

/// Configuration for the SLA engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Interval between evaluation ticks
    pub tick_interval: Duration,
    /// Percent-complete threshold at which incidents become at-risk
    pub at_risk_threshold_pct: f64,
    /// Upper bound on each escalation action handler call
    pub action_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
            at_risk_threshold_pct: DEFAULT_AT_RISK_THRESHOLD_PCT,
            action_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Set the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the at-risk threshold.
    pub fn with_at_risk_threshold(mut self, pct: f64) -> Self {
        self.at_risk_threshold_pct = pct;
        self
    }

    /// Set the per-action timeout.
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(30));
        assert_eq!(config.at_risk_threshold_pct, 80.0);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_tick_interval(Duration::from_secs(5))
            .with_at_risk_threshold(90.0)
            .with_action_timeout(Duration::from_secs(2));

        assert_eq!(config.tick_interval, Duration::from_secs(5));
        assert_eq!(config.at_risk_threshold_pct, 90.0);
        assert_eq!(config.action_timeout, Duration::from_secs(2));
    }
}
