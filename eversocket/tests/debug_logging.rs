//! The opt-in debug diagnostics channel.

#![cfg(feature = "client")]

use std::sync::Arc;
use std::time::Duration;

use eversocket::prelude::*;
use eversocket_core::testing::MockFactory;
use tracing_test::traced_test;

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn debug_option_emits_lifecycle_diagnostics() {
    let factory = MockFactory::new();
    let socket = ReconnectingSocket::builder("wss://feed.example.test")
        .factory(Arc::clone(&factory) as Arc<dyn TransportFactory>)
        .config(SocketConfig::default().debug(true))
        .build()
        .expect("socket builds");
    settle().await;

    factory.transport(0).emit_open(None);
    factory.transport(0).emit_message(Message::text("tick"));
    settle().await;
    factory.transport(0).emit_close(CloseFrame::abnormal());
    settle().await;

    assert!(logs_contain("attempt-connect"));
    assert!(logs_contain("open"));
    assert!(logs_contain("message"));
    assert!(logs_contain("close"));
    assert!(logs_contain("reconnect-scheduled"));

    socket.close(None, None);
    settle().await;
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn debug_diagnostics_stay_silent_by_default() {
    let factory = MockFactory::new();
    let _socket = ReconnectingSocket::builder("wss://feed.example.test")
        .factory(Arc::clone(&factory) as Arc<dyn TransportFactory>)
        .build()
        .expect("socket builds");
    settle().await;
    factory.transport(0).emit_open(None);
    tokio::time::sleep(Duration::from_millis(10)).await;
    settle().await;

    assert!(!logs_contain("attempt-connect"));
}
