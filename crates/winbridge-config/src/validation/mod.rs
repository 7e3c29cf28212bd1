//! Full configuration validation.
//!
//! Collects every problem into a single `ConfigError` rather than stopping
//! at the first one. [`repair`] resets only the offending fields.

mod helpers;


use crate::schema::{BridgeConfig, BusConfig, MainWindowConfig};
use winbridge_common::ConfigError;

use helpers::{validate_non_blank, validate_range};

const MIN_BUS_CAPACITY: u32 = 1;
const MAX_BUS_CAPACITY: u32 = 4096;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BridgeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_non_blank(&mut errors, "main_window.label", &config.main_window.label);
    validate_range(
        &mut errors,
        "bus.capacity",
        config.bus.capacity,
        MIN_BUS_CAPACITY,
        MAX_BUS_CAPACITY,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Reset every invalid field to its default, keeping the valid ones.
/// Returns the names of the fields that were reset.
pub fn repair(config: &mut BridgeConfig) -> Vec<&'static str> {
    let mut reset = Vec::new();

    if config.main_window.label.trim().is_empty() {
        config.main_window.label = MainWindowConfig::default().label;
        reset.push("main_window.label");
    }
    if !(MIN_BUS_CAPACITY..=MAX_BUS_CAPACITY).contains(&config.bus.capacity) {
        config.bus.capacity = BusConfig::default().capacity;
        reset.push("bus.capacity");
    }

    reset
}
