use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// A payload arriving on the event bus could not be turned into a typed value.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("failed to decode `{event}` payload: {source}")]
    Decode {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures reported by the host window manager, event emitter or process control.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("window not found: {0}")]
    WindowNotFound(String),

    #[error("failed to create window `{label}`: {reason}")]
    CreationFailed { label: String, reason: String },

    #[error("{op} failed on window `{label}`: {reason}")]
    Operation {
        op: &'static str,
        label: String,
        reason: String,
    },

    #[error("emit error: {0}")]
    Emit(String),

    #[error("process error: {0}")]
    Process(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
