use winbridge_common::{Label, WindowHandle, WindowRole};

/// The window a coordinator runs in. Show/hide requests act on this window
/// and only when it is the main window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowContext {
    pub label: Label,
    pub role: WindowRole,
}

impl WindowContext {
    pub fn new(label: impl Into<Label>, role: WindowRole) -> Self {
        Self {
            label: label.into(),
            role,
        }
    }

    /// Context whose role is derived from the configured main label.
    pub fn resolve(label: impl Into<Label>, main_label: &str) -> Self {
        let label = label.into();
        let role = WindowRole::resolve(&label, main_label);
        Self { label, role }
    }
}

/// Coordinator settings.
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Exact label treated as main for create payloads without a role.
    pub main_label: String,
    /// Serialize create requests per label.
    pub serialize_by_label: bool,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            main_label: "main".to_string(),
            serialize_by_label: true,
        }
    }
}

/// What a create request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// No window had the label; a new one was built.
    Created(WindowHandle),
    /// The existing main window was closed and rebuilt.
    Replaced(WindowHandle),
    /// An existing secondary window was unminimized and focused instead.
    Focused(WindowHandle),
}

impl CreateOutcome {
    pub fn handle(&self) -> &WindowHandle {
        match self {
            Self::Created(h) | Self::Replaced(h) | Self::Focused(h) => h,
        }
    }
}

/// Result of a show/hide request that is guarded on the main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Applied,
    /// The coordinator's own window is not the main window; nothing was done.
    Skipped,
}
