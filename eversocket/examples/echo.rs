//! Echo demo: a reconnecting socket over an in-process loopback transport.
//!
//! The loopback transport opens instantly and echoes every sent message
//! back, which is enough to show the full event surface — including a
//! forced reconnect via `refresh()` — without any network.
//!
//! Run with: `cargo run -p eversocket --example echo`

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use eversocket::prelude::*;

struct LoopbackFactory;

impl TransportFactory for LoopbackFactory {
    fn open(&self, request: TransportRequest) -> Result<TransportLink, TransportError> {
        let (events, events_rx) = mpsc::unbounded_channel();
        let _ = events.send(TransportEvent::Opened {
            protocol: request.protocols.first().cloned(),
        });
        Ok(TransportLink {
            sink: Box::new(LoopbackSink { events }),
            events: events_rx,
        })
    }
}

struct LoopbackSink {
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportSink for LoopbackSink {
    fn send(&mut self, message: Message) -> Result<(), TransportError> {
        self.events
            .send(TransportEvent::Message(message))
            .map_err(|_| TransportError::Failed("loopback peer is gone".to_string()))
    }

    fn close(&mut self, code: Option<u16>, reason: Option<&str>) {
        let frame = CloseFrame::new(
            code.map(CloseCode::from).unwrap_or(CloseCode::Normal),
            reason.unwrap_or(""),
            true,
        );
        let _ = self.events.send(TransportEvent::Closed(frame));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let socket = ReconnectingSocket::builder("loopback://echo")
        .add_protocol("echo.v1")
        .factory(Arc::new(LoopbackFactory))
        .config(SocketConfig::default().reconnect_interval(Duration::from_millis(250)))
        .on_connecting(|event| println!("connecting (reconnect: {})", event.is_reconnect))
        .on_open(|event| println!("open (reconnect: {})", event.is_reconnect))
        .on_message(|message| println!("echoed back: {}", message))
        .on_close(|frame| println!("closed: code {}", frame.code))
        .build()?;

    tokio::time::sleep(Duration::from_millis(50)).await;

    socket.send_text("hello")?;
    socket.send_text("world")?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Force a reconnect cycle; the socket comes back on its own.
    socket.refresh();
    tokio::time::sleep(Duration::from_millis(500)).await;

    socket.send_text("back again")?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    socket.close(None, Some("demo over"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    Ok(())
}
