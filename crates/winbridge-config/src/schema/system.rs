//! System configuration types: event bus and logging.

use serde::{Deserialize, Serialize};

/// Event bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Buffer size of the event bus and depth of the binary's input and
    /// output queues (valid range: 1-4096). Bus subscribers that fall
    /// further behind than this skip envelopes; a full queue makes its
    /// producer wait instead.
    pub capacity: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// The `tracing` level name for this setting.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
