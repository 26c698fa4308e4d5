//! Configuration structures.
//!
//! Configuration is loaded from environment variables and config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Global connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Socket emulation configuration.
    #[serde(default)]
    pub socket: SocketConfig,

    /// Display translation configuration.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Socket emulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Delay before the open callback fires. The connection is always
    /// trivially connectable; this is the only externally observed timer.
    #[serde(with = "humantime_serde")]
    pub open_delay: Duration,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            open_delay: Duration::from_millis(500),
        }
    }
}

/// Display translation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Width forced onto vector graphics, in pixels.
    pub graphic_width: u32,

    /// Height forced onto vector graphics, in pixels.
    pub graphic_height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            graphic_width: 480,
            graphic_height: 360,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
