use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a window instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Whether a window is the singleton main window or an ordinary secondary one.
///
/// Main windows are replaced on a repeated create request; secondary windows
/// are brought to the front instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum WindowRole {
    Main,
    #[default]
    Secondary,
}

impl WindowRole {
    /// Role of `label` when no explicit role was requested: `Main` only on an
    /// exact match with the configured main label.
    pub fn resolve(label: &Label, main_label: &str) -> Self {
        if label.as_str() == main_label {
            Self::Main
        } else {
            Self::Secondary
        }
    }

    pub fn is_main(self) -> bool {
        self == Self::Main
    }
}

impl fmt::Display for WindowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Secondary => f.write_str("secondary"),
        }
    }
}

/// Snapshot of a live window as known to the host at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowHandle {
    pub label: Label,
    pub role: WindowRole,
}

impl WindowHandle {
    pub fn new(label: impl Into<Label>, role: WindowRole) -> Self {
        Self {
            label: label.into(),
            role,
        }
    }
}
