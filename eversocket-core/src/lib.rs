//! # EverSocket Core
//!
//! Shared vocabulary for EverSocket, the self-healing socket client.
//!
//! This crate defines everything the reconnect core and a transport provider
//! have to agree on:
//!
//! - Error taxonomy and RFC 6455 close codes
//! - Application message payloads
//! - Subscriber-facing event payloads
//! - The transport capability (factory, sink, event stream)
//!
//! It deliberately contains no wire protocol: framing, handshakes, TLS, and
//! DNS belong to the transport provider behind the capability boundary.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/eversocket-core/")]

// Core modules
pub mod error;
pub mod event;
pub mod message;
pub mod transport;

// Scripted transport for downstream tests
#[cfg(feature = "test-util")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing;

// Prelude module with common imports
pub mod prelude;

// Re-export key types for convenience
pub use error::{CloseCode, ConfigError, Error, Result, TransportError};
pub use event::{CloseFrame, ConnectingEvent, ErrorEvent, EventKind, OpenEvent, SocketEvent};
pub use message::{Message, MessageKind};
pub use transport::{
    BinaryKind, TransportEvent, TransportFactory, TransportLink, TransportRequest, TransportSink,
};
