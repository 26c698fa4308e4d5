//! Core types for the loopback kernel connection.
//!
//! This module provides foundational types used throughout the system:
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for socket, display, and observability

mod config;
mod errors;

pub use config::{Config, DisplayConfig, ObservabilityConfig, SocketConfig};
pub use errors::{Error, Result};
