//! Subscriber-facing event payloads
//!
//! A reconnecting socket notifies its subscribers through a closed set of
//! event kinds: `connecting`, `open`, `close`, `message`, and `error`. The
//! `connecting`, `open`, and `error` payloads extend the underlying transport
//! event with an `is_reconnect` flag so callers can tell an initial
//! connection from a retry; `close` and `message` pass the transport's data
//! through unchanged.

use crate::error::{CloseCode, TransportError};
use crate::message::Message;

/// The closed set of event kinds a reconnecting socket emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// A connection attempt is starting
    Connecting,
    /// The transport reached the open state
    Open,
    /// The transport closed
    Close,
    /// The transport delivered an application message
    Message,
    /// The transport reported an error
    Error,
}

/// A close delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CloseFrame {
    /// Close code reported by the transport
    pub code: CloseCode,
    /// Close reason, possibly empty
    pub reason: String,
    /// Whether the close completed cleanly
    pub was_clean: bool,
}

impl CloseFrame {
    /// Create a close frame
    pub fn new(code: CloseCode, reason: impl Into<String>, was_clean: bool) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean,
        }
    }

    /// A clean, normal closure
    pub fn normal() -> Self {
        Self::new(CloseCode::Normal, "", true)
    }

    /// An abnormal closure, used when the transport vanished without
    /// delivering a close event
    pub fn abnormal() -> Self {
        Self::new(CloseCode::Abnormal, "", false)
    }
}

/// Payload of a `connecting` notification
///
/// When the attempt is a retry, `prior_close` carries the close that
/// triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectingEvent {
    /// True when this attempt is an automatic reconnect
    pub is_reconnect: bool,
    /// The close that triggered the retry, absent on an explicit open
    pub prior_close: Option<CloseFrame>,
}

impl ConnectingEvent {
    /// Payload for an explicit, non-reconnect open
    pub fn initial() -> Self {
        Self {
            is_reconnect: false,
            prior_close: None,
        }
    }

    /// Payload for an automatic retry after the given close
    pub fn retry(prior_close: CloseFrame) -> Self {
        Self {
            is_reconnect: true,
            prior_close: Some(prior_close),
        }
    }
}

/// Payload of an `open` notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenEvent {
    /// True when this open concluded an automatic reconnect
    pub is_reconnect: bool,
    /// Subprotocol the transport negotiated, if any
    pub protocol: Option<String>,
}

/// Payload of an `error` notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    /// Always false: errors are reported against the current transport, not
    /// against a retry decision
    pub is_reconnect: bool,
    /// The transport's error
    pub error: TransportError,
}

impl ErrorEvent {
    /// Wrap a transport error for subscribers
    pub fn new(error: TransportError) -> Self {
        Self {
            is_reconnect: false,
            error,
        }
    }
}

/// A notification as dispatched to subscribers, tagged by kind
///
/// Individual listener registries receive the typed payloads directly; this
/// enum exists for callers that want to funnel every notification through a
/// single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// A connection attempt is starting
    Connecting(ConnectingEvent),
    /// The transport reached the open state
    Open(OpenEvent),
    /// The transport closed
    Close(CloseFrame),
    /// The transport delivered an application message
    Message(Message),
    /// The transport reported an error
    Error(ErrorEvent),
}

impl SocketEvent {
    /// Get the event kind
    pub fn kind(&self) -> EventKind {
        match self {
            SocketEvent::Connecting(_) => EventKind::Connecting,
            SocketEvent::Open(_) => EventKind::Open,
            SocketEvent::Close(_) => EventKind::Close,
            SocketEvent::Message(_) => EventKind::Message,
            SocketEvent::Error(_) => EventKind::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connecting_event_constructors() {
        let initial = ConnectingEvent::initial();
        assert!(!initial.is_reconnect);
        assert!(initial.prior_close.is_none());

        let retry = ConnectingEvent::retry(CloseFrame::abnormal());
        assert!(retry.is_reconnect);
        assert_eq!(retry.prior_close.unwrap().code, CloseCode::Abnormal);
    }

    #[test]
    fn test_close_frame_presets() {
        let normal = CloseFrame::normal();
        assert!(normal.was_clean);
        assert!(!normal.code.is_error());

        let abnormal = CloseFrame::abnormal();
        assert!(!abnormal.was_clean);
        assert_eq!(abnormal.code.code(), 1006);
    }

    #[test]
    fn test_socket_event_kinds() {
        let event = SocketEvent::Message(Message::text("hi"));
        assert_eq!(event.kind(), EventKind::Message);

        let event = SocketEvent::Error(ErrorEvent::new(TransportError::NotOpen));
        assert_eq!(event.kind(), EventKind::Error);
        assert!(!match event {
            SocketEvent::Error(e) => e.is_reconnect,
            _ => unreachable!(),
        });
    }
}
