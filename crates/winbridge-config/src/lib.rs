//! winbridge configuration system.
//!
//! TOML-based configuration with validation. All config sections use
//! sensible defaults so partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{BridgeConfig, LogLevel, CONFIG_SCHEMA_VERSION};

use std::path::Path;
use winbridge_common::ConfigError;

/// Load config from the platform default path, creating it if missing.
/// Invalid fields come back already reset to their defaults.
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    toml_loader::load_default()
}

/// Load config from an explicit path (e.g. a `--config` override).
pub fn load_config_from(path: &Path) -> Result<BridgeConfig, ConfigError> {
    toml_loader::load_from_path(path)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &BridgeConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
