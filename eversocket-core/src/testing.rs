//! Mock transport for tests
//!
//! A scriptable in-memory implementation of the transport capability. Tests
//! drive the transport side by hand: emit the open event (or don't, to
//! exercise connection timeouts), push messages and errors, close cleanly or
//! drop the event stream outright. The factory records every transport it
//! constructed so tests can count connection attempts and inspect what the
//! socket sent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::Instant;

use crate::error::{CloseCode, TransportError};
use crate::event::CloseFrame;
use crate::message::Message;
use crate::transport::{
    TransportEvent, TransportFactory, TransportLink, TransportRequest, TransportSink,
};

/// A close requested through the sink half
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    /// Requested close code, if the caller supplied one
    pub code: Option<u16>,
    /// Requested close reason, if the caller supplied one
    pub reason: Option<String>,
}

#[derive(Debug)]
struct MockState {
    request: TransportRequest,
    opened_at: Instant,
    open: AtomicBool,
    closed: AtomicBool,
    respond_to_close: AtomicBool,
    sent: Mutex<Vec<Message>>,
    close_requests: Mutex<Vec<CloseRequest>>,
    events: Mutex<Option<UnboundedSender<TransportEvent>>>,
}

impl MockState {
    fn push_event(&self, event: TransportEvent) {
        if let Some(events) = self.events.lock().unwrap().as_ref() {
            // The receiver half is gone once the socket abandons this
            // transport; a failed send is not an error for the test side.
            let _ = events.send(event);
        }
    }
}

/// Test-side handle to one mock transport
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    /// The request this transport was constructed from
    pub fn request(&self) -> TransportRequest {
        self.state.request.clone()
    }

    /// When the factory constructed this transport, on the tokio clock
    pub fn opened_at(&self) -> Instant {
        self.state.opened_at
    }

    /// Mark the transport open and deliver the open event
    pub fn emit_open(&self, protocol: Option<&str>) {
        self.state.open.store(true, Ordering::SeqCst);
        self.state.push_event(TransportEvent::Opened {
            protocol: protocol.map(str::to_string),
        });
    }

    /// Deliver an application message
    pub fn emit_message(&self, message: Message) {
        self.state.push_event(TransportEvent::Message(message));
    }

    /// Deliver a transport error
    pub fn emit_error(&self, error: TransportError) {
        self.state.push_event(TransportEvent::Errored(error));
    }

    /// Close the transport with the given frame
    pub fn emit_close(&self, frame: CloseFrame) {
        self.state.open.store(false, Ordering::SeqCst);
        self.state.closed.store(true, Ordering::SeqCst);
        self.state.push_event(TransportEvent::Closed(frame));
    }

    /// Drop the event stream without a close event, as a vanished peer would
    pub fn disconnect(&self) {
        self.state.open.store(false, Ordering::SeqCst);
        self.state.closed.store(true, Ordering::SeqCst);
        self.state.events.lock().unwrap().take();
    }

    /// Whether the sink half should answer a close request with a clean
    /// close event (the default) or stay silent
    pub fn respond_to_close(&self, respond: bool) {
        self.state.respond_to_close.store(respond, Ordering::SeqCst);
    }

    /// Messages the socket sent through this transport
    pub fn sent(&self) -> Vec<Message> {
        self.state.sent.lock().unwrap().clone()
    }

    /// Close requests the socket issued on this transport
    pub fn close_requests(&self) -> Vec<CloseRequest> {
        self.state.close_requests.lock().unwrap().clone()
    }
}

struct MockSink {
    state: Arc<MockState>,
}

impl TransportSink for MockSink {
    fn send(&mut self, message: Message) -> Result<(), TransportError> {
        if !self.state.open.load(Ordering::SeqCst) {
            return Err(TransportError::NotOpen);
        }
        self.state.sent.lock().unwrap().push(message);
        Ok(())
    }

    fn close(&mut self, code: Option<u16>, reason: Option<&str>) {
        self.state.close_requests.lock().unwrap().push(CloseRequest {
            code,
            reason: reason.map(str::to_string),
        });
        if self.state.respond_to_close.load(Ordering::SeqCst)
            && !self.state.closed.swap(true, Ordering::SeqCst)
        {
            self.state.open.store(false, Ordering::SeqCst);
            let frame = CloseFrame::new(
                code.map(CloseCode::from).unwrap_or(CloseCode::Normal),
                reason.unwrap_or(""),
                true,
            );
            self.state.push_event(TransportEvent::Closed(frame));
        }
    }

    fn protocol(&self) -> Option<String> {
        if self.state.open.load(Ordering::SeqCst) {
            self.state.request.protocols.first().cloned()
        } else {
            None
        }
    }
}

/// Mock transport factory
///
/// Every `open` call constructs a fresh [`MockTransport`] and records it.
#[derive(Debug, Default)]
pub struct MockFactory {
    transports: Mutex<Vec<MockTransport>>,
    rejections: Mutex<VecDeque<TransportError>>,
}

impl MockFactory {
    /// Create a factory with no scripted rejections
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `open` call fail with the given error
    pub fn reject_next(&self, error: TransportError) {
        self.rejections.lock().unwrap().push_back(error);
    }

    /// Number of transports constructed so far
    pub fn created(&self) -> usize {
        self.transports.lock().unwrap().len()
    }

    /// Test-side handle to the `index`-th constructed transport
    pub fn transport(&self, index: usize) -> MockTransport {
        self.transports.lock().unwrap()[index].clone()
    }

    /// Test-side handle to the most recently constructed transport
    pub fn last(&self) -> MockTransport {
        self.transports
            .lock()
            .unwrap()
            .last()
            .expect("no transport constructed yet")
            .clone()
    }
}

impl TransportFactory for MockFactory {
    fn open(&self, request: TransportRequest) -> Result<TransportLink, TransportError> {
        if let Some(error) = self.rejections.lock().unwrap().pop_front() {
            return Err(error);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(MockState {
            request,
            opened_at: Instant::now(),
            open: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            respond_to_close: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
            close_requests: Mutex::new(Vec::new()),
            events: Mutex::new(Some(tx)),
        });

        self.transports.lock().unwrap().push(MockTransport {
            state: Arc::clone(&state),
        });

        Ok(TransportLink {
            sink: Box::new(MockSink { state }),
            events: rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_send_gated_on_open() {
        let factory = MockFactory::new();
        let mut link = factory
            .open(TransportRequest::new("wss://test"))
            .expect("mock open");

        assert_eq!(
            link.sink.send(Message::text("early")),
            Err(TransportError::NotOpen)
        );

        factory.last().emit_open(None);
        assert!(matches!(
            link.events.recv().await,
            Some(TransportEvent::Opened { .. })
        ));

        link.sink.send(Message::text("hello")).expect("send");
        assert_eq!(factory.last().sent(), vec![Message::text("hello")]);
    }

    #[tokio::test]
    async fn test_mock_close_answers_with_clean_close() {
        let factory = MockFactory::new();
        let mut link = factory
            .open(TransportRequest::new("wss://test"))
            .expect("mock open");
        factory.last().emit_open(None);
        let _ = link.events.recv().await;

        link.sink.close(Some(4000), Some("done"));
        match link.events.recv().await {
            Some(TransportEvent::Closed(frame)) => {
                assert_eq!(frame.code, CloseCode::Application(4000));
                assert_eq!(frame.reason, "done");
                assert!(frame.was_clean);
            }
            other => panic!("expected close event, got {:?}", other),
        }
        assert_eq!(factory.last().close_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_disconnect_ends_stream() {
        let factory = MockFactory::new();
        let mut link = factory
            .open(TransportRequest::new("wss://test"))
            .expect("mock open");
        factory.last().disconnect();
        assert!(link.events.recv().await.is_none());
    }

    #[test]
    fn test_mock_rejection() {
        let factory = MockFactory::new();
        factory.reject_next(TransportError::Rejected("dns".into()));
        assert!(factory.open(TransportRequest::new("wss://test")).is_err());
        assert_eq!(factory.created(), 0);
    }
}
