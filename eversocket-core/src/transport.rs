//! Transport capability
//!
//! EverSocket does not implement a wire protocol of its own. The reconnect
//! core consumes the underlying socket through the narrow capability defined
//! here: a factory constructs a transport bound to a URL, the transport
//! accepts `send`/`close` calls through its sink half, and it reports its
//! lifecycle (open, message, close, error) asynchronously on an event stream.
//! Open and close are totally ordered per transport instance; a transport
//! fires open at most once and close at most once.

use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::TransportError;
use crate::event::CloseFrame;
use crate::message::Message;

/// Representation requested for binary payloads
///
/// Mirrors the binary type knob of browser-style sockets; native transports
/// that only have one representation may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryKind {
    /// Blob-equivalent representation
    #[default]
    Blob,
    /// Array-buffer-equivalent representation
    ArrayBuffer,
}

/// Everything a factory needs to construct one transport
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Target endpoint address
    pub url: String,
    /// Subprotocols offered to the peer, in preference order
    pub protocols: Vec<String>,
    /// Requested binary payload representation
    pub binary_kind: BinaryKind,
}

impl TransportRequest {
    /// Create a request with no subprotocols and the default binary kind
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            protocols: Vec::new(),
            binary_kind: BinaryKind::default(),
        }
    }
}

/// Lifecycle events a transport delivers on its event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The transport finished connecting and is ready to send
    Opened {
        /// Subprotocol the peer accepted, if any
        protocol: Option<String>,
    },
    /// An application message arrived
    Message(Message),
    /// The transport closed; no further events follow
    Closed(CloseFrame),
    /// The transport reported an error; the transport may still close
    /// afterwards
    Errored(TransportError),
}

/// The caller-facing half of a transport
///
/// `send` and `close` are fire-and-forget relative to the transport's own
/// asynchronous delivery; outcomes show up on the event stream.
pub trait TransportSink: Send {
    /// Send an application message
    ///
    /// Fails with [`TransportError::NotOpen`] if the transport has not
    /// reached the open state yet.
    fn send(&mut self, message: Message) -> Result<(), TransportError>;

    /// Request the transport close with an optional code and reason
    ///
    /// The transport answers with a `Closed` event once the close completes.
    fn close(&mut self, code: Option<u16>, reason: Option<&str>);

    /// Subprotocol negotiated with the peer, if any
    fn protocol(&self) -> Option<String> {
        None
    }

    /// Extensions in effect on this transport
    fn extensions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Bytes accepted by `send` but not yet handed to the network
    fn buffered_amount(&self) -> u64 {
        0
    }
}

/// A freshly constructed transport: its sink half plus its event stream
#[derive(Debug)]
pub struct TransportLink {
    /// The caller-facing half
    pub sink: Box<dyn TransportSink>,
    /// Lifecycle events, delivered in order
    pub events: UnboundedReceiver<TransportEvent>,
}

impl std::fmt::Debug for dyn TransportSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSink")
            .field("protocol", &self.protocol())
            .field("buffered_amount", &self.buffered_amount())
            .finish()
    }
}

/// Constructor capability for transports
///
/// The factory call must not block: a real implementation spawns whatever
/// connection work it needs and reports the outcome on the link's event
/// stream, so the reconnect core's connection-timeout logic stays in charge
/// of slow connects.
pub trait TransportFactory: Send + Sync + 'static {
    /// Construct a transport bound to the request's URL
    fn open(&self, request: TransportRequest) -> Result<TransportLink, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct NullSink;

    impl TransportSink for NullSink {
        fn send(&mut self, _message: Message) -> Result<(), TransportError> {
            Err(TransportError::NotOpen)
        }

        fn close(&mut self, _code: Option<u16>, _reason: Option<&str>) {}
    }

    #[test]
    fn test_sink_defaults() {
        let sink = NullSink;
        assert_eq!(sink.protocol(), None);
        assert!(sink.extensions().is_empty());
        assert_eq!(sink.buffered_amount(), 0);
    }

    #[test]
    fn test_transport_request() {
        let request = TransportRequest::new("wss://example.test/feed");
        assert_eq!(request.url, "wss://example.test/feed");
        assert!(request.protocols.is_empty());
        assert_eq!(request.binary_kind, BinaryKind::Blob);
    }

    #[tokio::test]
    async fn test_event_stream_ordering() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(TransportEvent::Opened { protocol: None }).unwrap();
        tx.send(TransportEvent::Message(Message::text("a"))).unwrap();
        tx.send(TransportEvent::Closed(CloseFrame::normal())).unwrap();

        assert!(matches!(rx.recv().await, Some(TransportEvent::Opened { .. })));
        assert!(matches!(rx.recv().await, Some(TransportEvent::Message(_))));
        assert!(matches!(rx.recv().await, Some(TransportEvent::Closed(_))));
    }
}
