//! Multi-window lifecycle coordination for a webview desktop shell.
//!
//! Relays named events between the host process and its windows:
//! - `parameter-init` updates the shared [`ParameterStore`]
//! - `tauri-win-*` control events drive the [`WindowCoordinator`]
//! - `tauri-win-setdata` payloads are rebroadcast as `win-postdata`
//! - `tauri-playboard-init` is handed to a host-side worker by [`PlayboardRelay`]
//!
//! The host itself (window manager, event emitter, process control) is
//! reached only through the traits in [`host`].

pub mod coordinator;
pub mod headless;
pub mod host;
pub mod parameters;
pub mod playboard;
pub mod protocol;

pub use coordinator::{
    CoordinatorOptions, CreateOutcome, GuardOutcome, WindowContext, WindowCoordinator,
};
pub use headless::{HeadlessHost, HostCall, WindowRecord};
pub use host::{EventEmitter, ProcessControl, WindowManager};
pub use parameters::{to_number, ParameterConfig, ParameterStore};
pub use playboard::PlayboardRelay;
pub use protocol::{
    decode_payload, CreatePayload, InboundEvent, ParameterPayload, WindowCreateRequest,
    WindowOptions,
};
