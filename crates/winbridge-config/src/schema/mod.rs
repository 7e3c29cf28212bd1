//! Configuration schema types for winbridge.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod system;
mod window;

pub use system::*;
pub use window::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct BridgeConfig {
    pub main_window: MainWindowConfig,
    pub bus: BusConfig,
    pub coordinator: CoordinatorConfig,
    pub parameters: ParametersConfig,
    pub logging: LoggingConfig,
}
