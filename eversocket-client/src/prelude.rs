//! Prelude module for EverSocket Client
//!
//! This module re-exports commonly used types and traits to make them
//! easily accessible for users of the client library.

pub use crate::config::SocketConfig;
pub use crate::registry::ListenerId;
pub use crate::socket::{ReadyState, ReconnectingSocket, SocketBuilder};

// Re-export core types for convenience
pub use eversocket_core::prelude::*;
pub use eversocket_core::{Message, Result};

// Re-export commonly used external dependencies
pub use std::sync::Arc;
pub use std::time::Duration;
