//! # EverSocket Client
//!
//! A socket client that survives its transport: automatic reconnection with
//! exponential backoff, connection-timeout detection, and a uniform event
//! surface that makes reconnection transparent to the caller.
//!
//! The client implements no wire protocol. It drives any transport provider
//! implementing the capability from [`eversocket_core`]: tests use the
//! scripted in-memory transport, production code plugs in a real socket
//! implementation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use eversocket_client::prelude::*;
//!
//! # fn transport_factory() -> Arc<dyn TransportFactory> { unimplemented!() }
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let socket = ReconnectingSocket::builder("wss://feed.example.test")
//!         .factory(transport_factory())
//!         .on_open(|event| {
//!             println!("connected (reconnect: {})", event.is_reconnect);
//!         })
//!         .on_message(|message| {
//!             println!("received: {}", message);
//!         })
//!         .build()?;
//!
//!     socket.send_text("subscribe")?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/eversocket-client/")]

// Public modules
pub mod config;
pub mod registry;
pub mod socket;

// Prelude module
pub mod prelude;

// Re-export key types for convenience
pub use config::SocketConfig;
pub use registry::ListenerId;
pub use socket::{ReadyState, ReconnectingSocket, SocketBuilder};
