//! Capabilities supplied by the host environment.
//!
//! The coordinator never owns windows. It issues commands against these
//! traits and queries the host's registry by label on demand.

use async_trait::async_trait;
use serde_json::Value;
use winbridge_common::{Envelope, EventBus, HostError, Label, WindowHandle};

use crate::protocol::WindowCreateRequest;

/// Window registry and window operations.
#[async_trait]
pub trait WindowManager: Send + Sync {
    /// Look up a live window by label.
    async fn get_window(&self, label: &Label) -> Option<WindowHandle>;

    /// Snapshot of every window the host knows about right now.
    async fn all_windows(&self) -> Vec<WindowHandle>;

    /// Construct a window. Resolves once the host reports the window as
    /// created, or with the host's error.
    async fn create_window(&self, request: &WindowCreateRequest)
        -> Result<WindowHandle, HostError>;

    async fn close(&self, label: &Label) -> Result<(), HostError>;
    async fn show(&self, label: &Label) -> Result<(), HostError>;
    async fn hide(&self, label: &Label) -> Result<(), HostError>;
    async fn unminimize(&self, label: &Label) -> Result<(), HostError>;
    async fn set_focus(&self, label: &Label) -> Result<(), HostError>;
    async fn maximize(&self, label: &Label) -> Result<(), HostError>;
}

/// Broadcast to every listening window.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    async fn emit(&self, event: &str, payload: Value) -> Result<(), HostError>;
}

/// Process lifetime control.
#[async_trait]
pub trait ProcessControl: Send + Sync {
    async fn exit(&self, code: i32) -> Result<(), HostError>;
    async fn relaunch(&self) -> Result<(), HostError>;
}

#[async_trait]
impl EventEmitter for EventBus {
    async fn emit(&self, event: &str, payload: Value) -> Result<(), HostError> {
        self.publish(Envelope::new(event, payload));
        Ok(())
    }
}
