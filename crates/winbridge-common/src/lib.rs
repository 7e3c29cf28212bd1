pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{BridgeError, ConfigError, HostError, PayloadError};
pub use events::{Envelope, EventBus};
pub use id::new_correlation_id;
pub use types::{Label, WindowHandle, WindowRole};
