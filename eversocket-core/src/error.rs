//! Error types for EverSocket
//!
//! This module defines the error taxonomy shared by the EverSocket crates.
//! Transport-reported failures are delivered to subscribers as notifications
//! and never escape the reconnect core as panics; the types here cover the
//! failures that are surfaced synchronously to callers.

use std::fmt;
use thiserror::Error;

/// Result type alias for EverSocket operations
///
/// The error type defaults to [`Error`] but can be overridden, so the alias
/// also covers transport-level results.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for EverSocket operations
#[derive(Error, Debug)]
pub enum Error {
    /// `send` was called while no transport is installed
    #[error("invalid state: no live transport (socket was never opened or is between connections)")]
    NotConnected,

    /// Transport-level errors
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors reported by or about the underlying transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport exists but has not finished opening yet
    #[error("transport is not open yet")]
    NotOpen,

    /// The transport factory refused to construct a transport
    #[error("transport rejected: {0}")]
    Rejected(String),

    /// The transport failed while established
    #[error("transport failed: {0}")]
    Failed(String),
}

/// Configuration errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("invalid configuration value for {field}: {value}")]
    InvalidValue {
        /// Offending field name
        field: String,
        /// Offending value, rendered for diagnostics
        value: String,
    },

    /// Configuration validation failed
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Socket close codes as defined in RFC 6455
///
/// The reconnect core treats close codes as opaque data from the transport;
/// this type only gives them names and a stable numeric mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CloseCode {
    /// Normal closure
    Normal,
    /// Going away
    Away,
    /// Protocol error
    ProtocolError,
    /// Unsupported data
    Unsupported,
    /// No status received
    NoStatus,
    /// Abnormal closure (connection dropped without a close frame)
    Abnormal,
    /// Policy violation
    PolicyViolation,
    /// Message too big
    TooBig,
    /// Internal server error
    Internal,
    /// Application-specific close code (3000-4999)
    Application(u16),
    /// Any other code the transport reported
    Other(u16),
}

impl CloseCode {
    /// Create a `CloseCode` from its numeric value
    pub fn from(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::Away,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::Unsupported,
            1005 => CloseCode::NoStatus,
            1006 => CloseCode::Abnormal,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::TooBig,
            1011 => CloseCode::Internal,
            code if (3000..=4999).contains(&code) => CloseCode::Application(code),
            code => CloseCode::Other(code),
        }
    }

    /// Get the numeric value of the close code
    pub fn code(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::Away => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::Unsupported => 1003,
            CloseCode::NoStatus => 1005,
            CloseCode::Abnormal => 1006,
            CloseCode::PolicyViolation => 1008,
            CloseCode::TooBig => 1009,
            CloseCode::Internal => 1011,
            CloseCode::Application(code) | CloseCode::Other(code) => *code,
        }
    }

    /// Check if this close code indicates an error
    pub fn is_error(&self) -> bool {
        !matches!(self, CloseCode::Normal | CloseCode::Away)
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_code_conversion() {
        assert_eq!(CloseCode::from(1000), CloseCode::Normal);
        assert_eq!(CloseCode::from(1006), CloseCode::Abnormal);
        assert_eq!(CloseCode::from(3000), CloseCode::Application(3000));
        assert_eq!(CloseCode::from(999), CloseCode::Other(999));
        assert_eq!(CloseCode::from(4999).code(), 4999);
    }

    #[test]
    fn test_close_code_error_classification() {
        assert!(!CloseCode::Normal.is_error());
        assert!(!CloseCode::Away.is_error());
        assert!(CloseCode::Abnormal.is_error());
        assert!(CloseCode::Application(4000).is_error());
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotConnected;
        assert!(err.to_string().contains("no live transport"));

        let err = Error::Transport(TransportError::NotOpen);
        assert!(err.to_string().contains("not open"));
    }
}
