//! Socket configuration
//!
//! This module provides the configuration record for the reconnecting
//! socket: reconnect pacing, connection-timeout duration, and the small set
//! of behavior switches the socket honors. The record is immutable once the
//! socket is built.

use std::time::Duration;

use eversocket_core::error::ConfigError;
use eversocket_core::transport::BinaryKind;
use eversocket_core::Result;

/// Reconnecting socket configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SocketConfig {
    /// Open a transport as soon as the socket is built
    pub automatic_open: bool,
    /// Binary payload representation requested from the transport
    pub binary_kind: BinaryKind,
    /// Emit diagnostic log lines for connect/open/close/message/error/timeout
    pub debug: bool,
    /// Base delay before the first reconnect attempt
    pub reconnect_interval: Duration,
    /// Ceiling for the reconnect delay
    pub max_reconnect_interval: Duration,
    /// Multiplier applied to the delay on each successive attempt
    pub reconnect_decay: f64,
    /// How long a pending connect may stay unanswered before it is abandoned
    pub timeout_interval: Duration,
    /// Give up after this many reconnect attempts; `None` retries forever
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            automatic_open: true,
            binary_kind: BinaryKind::Blob,
            debug: false,
            reconnect_interval: Duration::from_millis(1000),
            max_reconnect_interval: Duration::from_millis(30_000),
            reconnect_decay: 1.5,
            timeout_interval: Duration::from_millis(2000),
            max_reconnect_attempts: None,
        }
    }
}

impl SocketConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_interval.is_zero() {
            return Err(ConfigError::Validation(
                "reconnect_interval must be greater than 0".to_string(),
            )
            .into());
        }

        if self.timeout_interval.is_zero() {
            return Err(ConfigError::Validation(
                "timeout_interval must be greater than 0".to_string(),
            )
            .into());
        }

        if !self.reconnect_decay.is_finite() || self.reconnect_decay <= 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnect_decay".to_string(),
                value: self.reconnect_decay.to_string(),
            }
            .into());
        }

        if self.max_reconnect_interval < self.reconnect_interval {
            return Err(ConfigError::Validation(
                "max_reconnect_interval must be greater than or equal to reconnect_interval"
                    .to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// The delay before the reconnect attempt following `attempts` failures:
    /// `reconnect_interval * reconnect_decay^attempts`, clamped to
    /// `max_reconnect_interval`
    pub fn reconnect_delay(&self, attempts: u32) -> Duration {
        let base = self.reconnect_interval.as_millis() as f64;
        let grown = base * self.reconnect_decay.powf(f64::from(attempts));
        let capped = grown.min(self.max_reconnect_interval.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Set whether the socket opens a transport at build time
    pub fn automatic_open(mut self, automatic_open: bool) -> Self {
        self.automatic_open = automatic_open;
        self
    }

    /// Set the binary payload representation
    pub fn binary_kind(mut self, binary_kind: BinaryKind) -> Self {
        self.binary_kind = binary_kind;
        self
    }

    /// Enable or disable diagnostic logging
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the base reconnect delay
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Set the reconnect delay ceiling
    pub fn max_reconnect_interval(mut self, interval: Duration) -> Self {
        self.max_reconnect_interval = interval;
        self
    }

    /// Set the backoff multiplier
    pub fn reconnect_decay(mut self, decay: f64) -> Self {
        self.reconnect_decay = decay;
        self
    }

    /// Set the connection-timeout duration
    pub fn timeout_interval(mut self, interval: Duration) -> Self {
        self.timeout_interval = interval;
        self
    }

    /// Set the reconnect attempt ceiling
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_config_defaults() {
        let config = SocketConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.automatic_open);
        assert!(!config.debug);
        assert_eq!(config.binary_kind, BinaryKind::Blob);
        assert_eq!(config.reconnect_interval, Duration::from_millis(1000));
        assert_eq!(config.max_reconnect_interval, Duration::from_millis(30_000));
        assert_eq!(config.reconnect_decay, 1.5);
        assert_eq!(config.timeout_interval, Duration::from_millis(2000));
        assert_eq!(config.max_reconnect_attempts, None);
    }

    #[test]
    fn test_config_validation() {
        let config = SocketConfig::default().reconnect_interval(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = SocketConfig::default().timeout_interval(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = SocketConfig::default().reconnect_decay(1.0);
        assert!(config.validate().is_err());

        let config = SocketConfig::default().reconnect_decay(f64::NAN);
        assert!(config.validate().is_err());

        let config = SocketConfig::default()
            .reconnect_interval(Duration::from_secs(60))
            .max_reconnect_interval(Duration::from_secs(30));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = SocketConfig::default()
            .automatic_open(false)
            .debug(true)
            .reconnect_interval(Duration::from_millis(500))
            .max_reconnect_attempts(3);

        assert!(!config.automatic_open);
        assert!(config.debug);
        assert_eq!(config.reconnect_interval, Duration::from_millis(500));
        assert_eq!(config.max_reconnect_attempts, Some(3));
    }

    #[test]
    fn test_reconnect_delay_clamps_at_ceiling() {
        let config = SocketConfig::default()
            .reconnect_interval(Duration::from_millis(1000))
            .reconnect_decay(2.0)
            .max_reconnect_interval(Duration::from_millis(5000));

        let delays: Vec<u64> = (0..6)
            .map(|n| config.reconnect_delay(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000, 5000]);
    }

    proptest! {
        #[test]
        fn prop_reconnect_delay_formula(
            attempts in 0u32..64,
            interval_ms in 1u64..5_000,
            decay in 1.01f64..4.0,
            max_ms in 5_000u64..120_000,
        ) {
            let config = SocketConfig::default()
                .reconnect_interval(Duration::from_millis(interval_ms))
                .max_reconnect_interval(Duration::from_millis(max_ms))
                .reconnect_decay(decay);
            prop_assert!(config.validate().is_ok());

            let expected = (interval_ms as f64 * decay.powf(f64::from(attempts)))
                .min(max_ms as f64) as u64;
            prop_assert_eq!(config.reconnect_delay(attempts).as_millis() as u64, expected);
        }

        #[test]
        fn prop_reconnect_delay_monotonic(
            attempts in 0u32..63,
            interval_ms in 1u64..5_000,
            decay in 1.01f64..4.0,
        ) {
            let config = SocketConfig::default()
                .reconnect_interval(Duration::from_millis(interval_ms))
                .reconnect_decay(decay);

            prop_assert!(
                config.reconnect_delay(attempts + 1) >= config.reconnect_delay(attempts)
            );
            prop_assert!(config.reconnect_delay(attempts) <= config.max_reconnect_interval);
        }
    }
}
