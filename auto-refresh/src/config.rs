//! Configuration types for the auto-refresh controller
//!
//! Controls how often the fetch operation is re-run, how the timer catches up
//! after the runtime stalls, and how long shutdown may take.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::error::{RefreshError, Result};

/// Default refresh interval used by the invoice and customer views.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// What the timer does when it falls behind schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissedTick {
    /// Fire missed ticks back to back until caught up, staying wall-clock aligned
    #[default]
    Burst,
    /// Restart the schedule from the late tick
    Delay,
    /// Drop missed ticks and wait for the next aligned instant
    Skip,
}

impl From<MissedTick> for MissedTickBehavior {
    fn from(value: MissedTick) -> Self {
        match value {
            MissedTick::Burst => MissedTickBehavior::Burst,
            MissedTick::Delay => MissedTickBehavior::Delay,
            MissedTick::Skip => MissedTickBehavior::Skip,
        }
    }
}

/// Configuration for an [`AutoRefresh`](crate::AutoRefresh) controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Time between ticks. The first tick fires immediately on start.
    /// Default: 60 seconds
    pub interval: Duration,

    /// Catch-up policy when the runtime misses a tick
    /// Default: Burst
    pub missed_tick_behavior: MissedTick,

    /// How long `stop` waits for the timer task before aborting it
    /// Default: 5 seconds
    pub shutdown_timeout: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            missed_tick_behavior: MissedTick::Burst,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl RefreshConfig {
    /// Create a new RefreshConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for views that should feel live, such as an open invoice
    pub fn fast() -> Self {
        Self {
            interval: Duration::from_secs(5),
            ..Default::default()
        }
    }

    /// Preset for background views that rarely change
    pub fn relaxed() -> Self {
        Self {
            interval: Duration::from_secs(300),
            missed_tick_behavior: MissedTick::Skip,
            ..Default::default()
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(RefreshError::Configuration(
                "Refresh interval must be greater than 0".to_string(),
            ));
        }

        if self.shutdown_timeout.is_zero() {
            return Err(RefreshError::Configuration(
                "Shutdown timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_interval_millis(self, millis: u64) -> Self {
        self.with_interval(Duration::from_millis(millis))
    }

    pub fn with_missed_tick_behavior(mut self, behavior: MissedTick) -> Self {
        self.missed_tick_behavior = behavior;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = RefreshConfig::default();
        assert_eq!(config.interval, Duration::from_millis(60_000));
        assert_eq!(config.missed_tick_behavior, MissedTick::Burst);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(RefreshConfig::default().with_interval(Duration::ZERO))]
    #[case(RefreshConfig::default().with_interval_millis(0))]
    #[case(RefreshConfig::default().with_shutdown_timeout(Duration::ZERO))]
    fn test_invalid_configs_rejected(#[case] config: RefreshConfig) {
        let result = config.validate();
        assert!(matches!(result, Err(RefreshError::Configuration(_))));
    }

    #[test]
    fn test_config_presets() {
        let fast = RefreshConfig::fast();
        assert_eq!(fast.interval, Duration::from_secs(5));
        assert!(fast.validate().is_ok());

        let relaxed = RefreshConfig::relaxed();
        assert_eq!(relaxed.interval, Duration::from_secs(300));
        assert_eq!(relaxed.missed_tick_behavior, MissedTick::Skip);
        assert!(relaxed.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = RefreshConfig::new()
            .with_interval_millis(1500)
            .with_missed_tick_behavior(MissedTick::Delay)
            .with_shutdown_timeout(Duration::from_secs(1));

        assert_eq!(config.interval, Duration::from_millis(1500));
        assert_eq!(config.missed_tick_behavior, MissedTick::Delay);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(MissedTick::Burst, MissedTickBehavior::Burst)]
    #[case(MissedTick::Delay, MissedTickBehavior::Delay)]
    #[case(MissedTick::Skip, MissedTickBehavior::Skip)]
    fn test_missed_tick_conversion(#[case] ours: MissedTick, #[case] tokio: MissedTickBehavior) {
        assert_eq!(MissedTickBehavior::from(ours), tokio);
    }

    proptest! {
        #[test]
        fn prop_any_positive_interval_is_valid(millis in 1u64..=86_400_000) {
            let config = RefreshConfig::default().with_interval_millis(millis);
            prop_assert!(config.validate().is_ok());
            prop_assert_eq!(config.interval.as_millis() as u64, millis);
        }
    }
}
