//! Window lifecycle coordination.
//!
//! `WindowCoordinator` turns the six window control events into host window
//! manager calls: create-or-reuse, show/hide of its own window, exit,
//! relaunch, and the `setdata` -> `win-postdata` relay.

use std::sync::Arc;

use winbridge_common::{Label, WindowHandle};

use crate::host::{EventEmitter, ProcessControl, WindowManager};

mod lifecycle;
mod listener;
mod locks;
mod types;


use locks::LabelLocks;

pub use types::{CoordinatorOptions, CreateOutcome, GuardOutcome, WindowContext};

/// Coordinates windows on behalf of one window context.
///
/// Cheap to clone; clones share the same host handles and label locks.
#[derive(Clone)]
pub struct WindowCoordinator {
    context: WindowContext,
    options: CoordinatorOptions,
    windows: Arc<dyn WindowManager>,
    emitter: Arc<dyn EventEmitter>,
    process: Arc<dyn ProcessControl>,
    locks: Arc<LabelLocks>,
}

impl WindowCoordinator {
    pub fn new(
        context: WindowContext,
        options: CoordinatorOptions,
        windows: Arc<dyn WindowManager>,
        emitter: Arc<dyn EventEmitter>,
        process: Arc<dyn ProcessControl>,
    ) -> Self {
        Self {
            context,
            options,
            windows,
            emitter,
            process,
            locks: Arc::new(LabelLocks::default()),
        }
    }

    pub fn context(&self) -> &WindowContext {
        &self.context
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    /// Look up a window by label in the host registry.
    pub async fn get_window(&self, label: &Label) -> Option<WindowHandle> {
        self.windows.get_window(label).await
    }

    /// Every window the host knows about at call time.
    pub async fn all_windows(&self) -> Vec<WindowHandle> {
        self.windows.all_windows().await
    }
}
