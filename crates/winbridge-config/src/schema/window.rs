//! Window coordination settings.

use serde::{Deserialize, Serialize};

/// Identity of the singleton main window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MainWindowConfig {
    /// Exact label of the main window. Only this label is treated as main
    /// when a create request carries no explicit role.
    pub label: String,
}

impl Default for MainWindowConfig {
    fn default() -> Self {
        Self {
            label: "main".to_string(),
        }
    }
}

/// Coordinator behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Serialize create requests per label so lookup-then-act is atomic.
    pub serialize_by_label: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            serialize_by_label: true,
        }
    }
}

/// Initial width/height held before the first `parameter-init` event.
///
/// Kept as strings, matching the wire payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParametersConfig {
    pub width: String,
    pub height: String,
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            width: "0".to_string(),
            height: "0".to_string(),
        }
    }
}
