//! Prelude module for EverSocket Core
//!
//! This module re-exports commonly used types and traits to make them
//! easily accessible for users of the library.

pub use crate::error::{CloseCode, Error, Result, TransportError};
pub use crate::event::{CloseFrame, ConnectingEvent, ErrorEvent, EventKind, OpenEvent, SocketEvent};
pub use crate::message::{Message, MessageKind};
pub use crate::transport::{
    BinaryKind, TransportEvent, TransportFactory, TransportLink, TransportRequest, TransportSink,
};

// Re-export commonly used external dependencies
pub use bytes::Bytes;
pub use thiserror::Error as ThisError;

// Feature-gated re-exports
#[cfg(feature = "serde")]
pub use serde::{Deserialize, Serialize};
