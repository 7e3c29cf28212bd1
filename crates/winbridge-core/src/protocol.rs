//! Wire protocol between the host event bus and the coordinator.
//!
//! Every message is an [`Envelope`] with a string name and a JSON payload.
//! Payloads are decoded exactly once, here at the boundary, by
//! [`decode_payload`]; domain code only ever sees typed values.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use winbridge_common::{Envelope, Label, PayloadError, WindowRole};

pub const PARAMETER_INIT: &str = "parameter-init";
pub const WIN_CREATE: &str = "tauri-win-create";
pub const WIN_SHOW: &str = "tauri-win-show";
pub const WIN_HIDE: &str = "tauri-win-hide";
pub const WIN_EXIT: &str = "tauri-win-exit";
pub const WIN_RELAUNCH: &str = "tauri-win-relaunch";
pub const WIN_SETDATA: &str = "tauri-win-setdata";
/// Handled by the host process itself, not by any window.
pub const PLAYBOARD_INIT: &str = "tauri-playboard-init";

/// Outbound broadcast carrying a relayed `tauri-win-setdata` payload.
pub const WIN_POSTDATA: &str = "win-postdata";

/// Control events handled by the window coordinator.
pub const WINDOW_EVENTS: &[&str] = &[
    WIN_CREATE,
    WIN_SHOW,
    WIN_HIDE,
    WIN_EXIT,
    WIN_RELAUNCH,
    WIN_SETDATA,
];

// =============================================================================
// PAYLOADS
// =============================================================================

/// Window construction options.
///
/// `resizable` and `maximized` drive coordinator behaviour; the remaining
/// typed fields are the common host settings. Anything else the host
/// understands is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowOptions {
    #[serde(default = "default_resizable")]
    pub resizable: bool,
    #[serde(default)]
    pub maximized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorations: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_on_top: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn default_resizable() -> bool {
    true
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            resizable: true,
            maximized: false,
            title: None,
            url: None,
            width: None,
            height: None,
            x: None,
            y: None,
            center: None,
            visible: None,
            decorations: None,
            always_on_top: None,
            fullscreen: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Payload of `tauri-win-create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePayload {
    pub label: String,
    #[serde(default)]
    pub others: WindowOptions,
    /// Explicit role. When absent the role is derived from the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<WindowRole>,
}

impl CreatePayload {
    pub fn into_request(self, main_label: &str) -> WindowCreateRequest {
        let label = Label::new(self.label);
        let role = self
            .role
            .unwrap_or_else(|| WindowRole::resolve(&label, main_label));
        WindowCreateRequest {
            label,
            role,
            options: self.others,
        }
    }
}

/// A fully resolved request to open a window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowCreateRequest {
    pub label: Label,
    pub role: WindowRole,
    pub options: WindowOptions,
}

impl WindowCreateRequest {
    pub fn new(label: impl Into<Label>, role: WindowRole, options: WindowOptions) -> Self {
        Self {
            label: label.into(),
            role,
            options,
        }
    }
}

/// Payload of `parameter-init`. Numbers are accepted and kept in their
/// textual form so conversion happens in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub width: String,
    #[serde(deserialize_with = "string_or_number")]
    pub height: String,
}

impl ParameterPayload {
    pub fn new(width: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Number(n) => n.to_string(),
    })
}

// =============================================================================
// DECODING
// =============================================================================

/// Decode an event payload into `T`.
///
/// Hosts deliver payloads either as structured JSON or as a JSON document
/// serialized into a string. A string payload is parsed as JSON text first;
/// malformed text is a [`PayloadError::Decode`], never a silent default.
pub fn decode_payload<T: DeserializeOwned>(event: &str, payload: &Value) -> Result<T, PayloadError> {
    let decoded = match payload {
        Value::String(raw) => serde_json::from_str(raw),
        other => T::deserialize(other),
    };
    decoded.map_err(|source| PayloadError::Decode {
        event: event.to_string(),
        source,
    })
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    ParameterInit(ParameterPayload),
    Create(CreatePayload),
    Show,
    Hide,
    Exit,
    Relaunch,
    /// Opaque payload to rebroadcast as `win-postdata`.
    SetData(Value),
    /// Opaque payload handed to the host-side playboard worker.
    PlayboardInit(Value),
}

impl InboundEvent {
    /// Classify and decode an envelope. Names that are not inbound events
    /// (including our own `win-postdata`) yield `Ok(None)`.
    pub fn from_envelope(envelope: &Envelope) -> Result<Option<Self>, PayloadError> {
        let payload = &envelope.payload;
        let event = match envelope.event.as_str() {
            PARAMETER_INIT => Self::ParameterInit(decode_payload(PARAMETER_INIT, payload)?),
            WIN_CREATE => Self::Create(decode_payload(WIN_CREATE, payload)?),
            WIN_SHOW => Self::Show,
            WIN_HIDE => Self::Hide,
            WIN_EXIT => Self::Exit,
            WIN_RELAUNCH => Self::Relaunch,
            WIN_SETDATA => Self::SetData(payload.clone()),
            PLAYBOARD_INIT => Self::PlayboardInit(payload.clone()),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ParameterInit(_) => PARAMETER_INIT,
            Self::Create(_) => WIN_CREATE,
            Self::Show => WIN_SHOW,
            Self::Hide => WIN_HIDE,
            Self::Exit => WIN_EXIT,
            Self::Relaunch => WIN_RELAUNCH,
            Self::SetData(_) => WIN_SETDATA,
            Self::PlayboardInit(_) => PLAYBOARD_INIT,
        }
    }

    pub fn is_window_event(name: &str) -> bool {
        WINDOW_EVENTS.contains(&name)
    }
}
