//! # EverSocket
//!
//! **Self-healing socket client with exponential backoff and transparent
//! reconnection**
//!
//! EverSocket wraps a message-oriented, full-duplex transport and keeps it
//! alive: unintended closes trigger automatic reopening with exponential
//! backoff, pending connects are abandoned after a configurable timeout, and
//! subscribers see one uniform event surface across every reconnect.
//!
//! The transport itself — framing, handshakes, TLS — is not implemented
//! here. Any provider of the [`TransportFactory`] capability plugs in.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eversocket::prelude::*;
//!
//! # fn transport_factory() -> Arc<dyn TransportFactory> { unimplemented!() }
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let socket = ReconnectingSocket::builder("wss://feed.example.test")
//!         .factory(transport_factory())
//!         .config(SocketConfig::default().max_reconnect_attempts(10))
//!         .on_open(|event| println!("connected (reconnect: {})", event.is_reconnect))
//!         .on_message(|message| println!("received: {}", message))
//!         .on_close(|frame| println!("closed: {}", frame.code))
//!         .build()?;
//!
//!     socket.send_text("subscribe")?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/eversocket/")]

// Re-export core components
pub use eversocket_core::*;

#[cfg(feature = "client")]
pub use eversocket_client as client;

#[cfg(feature = "client")]
pub use eversocket_client::{ReadyState, ReconnectingSocket, SocketBuilder, SocketConfig};

/// Prelude module with common imports
pub mod prelude {
    pub use eversocket_core::prelude::*;

    #[cfg(feature = "client")]
    pub use eversocket_client::prelude::*;
}
