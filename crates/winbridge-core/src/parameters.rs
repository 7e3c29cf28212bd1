//! Shared width/height parameters, set by the `parameter-init` event.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use winbridge_common::{EventBus, PayloadError};

use crate::protocol::{decode_payload, ParameterPayload, PARAMETER_INIT};

/// Convert a numeric string the way the UI side does.
///
/// Locale independent. Surrounding whitespace is ignored, an empty string is
/// `0`, `0x`/`0o`/`0b` prefixes select a radix and `Infinity` may be signed.
/// Anything that is not a complete numeric literal is `NaN`; this never fails.
pub fn to_number(raw: &str) -> f64 {
    let s = raw.trim().trim_matches('\u{feff}');
    if s.is_empty() {
        return 0.0;
    }

    if let Some(value) = radix_literal(s) {
        return value;
    }

    let (sign, unsigned) = match s.as_bytes()[0] {
        b'+' => (1.0, &s[1..]),
        b'-' => (-1.0, &s[1..]),
        _ => (1.0, s),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }

    let literal_chars = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !literal_chars || !unsigned.bytes().any(|b| b.is_ascii_digit()) {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// `0x1F`, `0o17`, `0b101`. Signs are not allowed with a radix prefix.
fn radix_literal(s: &str) -> Option<f64> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let mut value = 0.0_f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => value = value * f64::from(radix) + f64::from(d),
            None => return Some(f64::NAN),
        }
    }
    Some(value)
}

/// Current width/height. Either field may be `NaN` after malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ParameterConfig {
    pub width: f64,
    pub height: f64,
}

impl ParameterConfig {
    pub fn from_payload(payload: &ParameterPayload) -> Self {
        Self {
            width: to_number(&payload.width),
            height: to_number(&payload.height),
        }
    }
}

/// Holds the single parameter configuration for this process.
///
/// Updates replace both fields at once; readers either take a copy with
/// [`get`](Self::get) or keep a [`watch::Receiver`] to observe changes.
#[derive(Clone)]
pub struct ParameterStore {
    tx: Arc<watch::Sender<ParameterConfig>>,
}

impl ParameterStore {
    /// A store holding `(0, 0)`.
    pub fn new() -> Self {
        Self::with_initial(ParameterConfig::default())
    }

    pub fn with_initial(initial: ParameterConfig) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> ParameterConfig {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ParameterConfig> {
        self.tx.subscribe()
    }

    /// Replace the stored values with the converted payload.
    pub fn init(&self, payload: &ParameterPayload) {
        let config = ParameterConfig::from_payload(payload);
        self.tx.send_replace(config);
        debug!(width = config.width, height = config.height, "parameters updated");
    }

    /// Decode a raw event payload (object or JSON string) and apply it.
    /// On a decode error the stored values are left untouched.
    pub fn init_from_value(&self, payload: &Value) -> Result<(), PayloadError> {
        let payload: ParameterPayload = decode_payload(PARAMETER_INIT, payload)?;
        self.init(&payload);
        Ok(())
    }

    /// Subscribe to `parameter-init` for the lifetime of the returned task.
    pub fn listen(&self, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) if envelope.event == PARAMETER_INIT => {
                        debug!(payload = %envelope.payload, "parameter-init received");
                        if let Err(e) = store.init_from_value(&envelope.payload) {
                            error!(event = PARAMETER_INIT, error = %e, "parameter payload rejected");
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("parameter listener lagged by {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use winbridge_common::Envelope;

    #[test]
    fn converts_plain_numbers_exactly() {
        for (raw, expected) in [
            ("0", 0.0),
            ("42", 42.0),
            ("12.5", 12.5),
            ("-3.25", -3.25),
            ("+7", 7.0),
            (".5", 0.5),
            ("5.", 5.0),
            ("1e3", 1000.0),
            ("2.5E-2", 0.025),
            ("1920", 1920.0),
        ] {
            assert_eq!(to_number(raw), expected, "input {raw:?}");
        }
    }

    #[test]
    fn trims_whitespace_and_treats_empty_as_zero() {
        assert_eq!(to_number("  800\n"), 800.0);
        assert_eq!(to_number(""), 0.0);
        assert_eq!(to_number("   "), 0.0);
    }

    #[test]
    fn radix_prefixes() {
        assert_eq!(to_number("0x1F"), 31.0);
        assert_eq!(to_number("0o17"), 15.0);
        assert_eq!(to_number("0b101"), 5.0);
        assert!(to_number("0x").is_nan());
        assert!(to_number("0xZZ").is_nan());
        assert!(to_number("-0x10").is_nan());
    }

    #[test]
    fn infinity_spelling() {
        assert_eq!(to_number("Infinity"), f64::INFINITY);
        assert_eq!(to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(to_number("infinity").is_nan());
        assert!(to_number("inf").is_nan());
    }

    #[test]
    fn non_numeric_is_nan_never_panics() {
        for raw in ["abc", "12px", "1,5", "NaN", "1e", ".", "--1", "1_000", "١٢"] {
            assert!(to_number(raw).is_nan(), "input {raw:?}");
        }
    }

    #[test]
    fn new_store_holds_zero() {
        let store = ParameterStore::new();
        assert_eq!(store.get(), ParameterConfig { width: 0.0, height: 0.0 });
    }

    #[test]
    fn init_replaces_both_fields() {
        let store = ParameterStore::new();
        store.init(&ParameterPayload::new("1280", "720"));
        assert_eq!(store.get(), ParameterConfig { width: 1280.0, height: 720.0 });

        store.init(&ParameterPayload::new("oops", "600"));
        let config = store.get();
        assert!(config.width.is_nan());
        assert_eq!(config.height, 600.0);
    }

    #[test]
    fn init_from_raw_string_payload() {
        let store = ParameterStore::new();
        store
            .init_from_value(&json!(r#"{"width":"300","height":"200"}"#))
            .unwrap();
        assert_eq!(store.get(), ParameterConfig { width: 300.0, height: 200.0 });
    }

    #[test]
    fn malformed_raw_string_is_an_error_and_keeps_values() {
        let store = ParameterStore::new();
        store.init(&ParameterPayload::new("10", "20"));

        let err = store.init_from_value(&json!("{\"width\": ")).unwrap_err();
        assert!(matches!(err, PayloadError::Decode { .. }));
        assert_eq!(store.get(), ParameterConfig { width: 10.0, height: 20.0 });
    }

    #[test]
    fn subscribers_observe_updates() {
        let store = ParameterStore::new();
        let mut rx = store.subscribe();
        store.init(&ParameterPayload::new("5", "6"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ParameterConfig { width: 5.0, height: 6.0 });
    }

    #[tokio::test]
    async fn listen_applies_parameter_init_events() {
        let bus = EventBus::new(16);
        let store = ParameterStore::new();
        let mut rx = store.subscribe();
        let _task = store.listen(&bus);

        bus.publish(Envelope::signal("tauri-win-show"));
        bus.publish(Envelope::new(
            PARAMETER_INIT,
            json!({"width": "1024", "height": "768"}),
        ));

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("no update within timeout")
            .unwrap();
        assert_eq!(store.get(), ParameterConfig { width: 1024.0, height: 768.0 });
    }

    #[tokio::test]
    async fn listen_survives_malformed_payload() {
        let bus = EventBus::new(16);
        let store = ParameterStore::new();
        let mut rx = store.subscribe();
        let _task = store.listen(&bus);

        bus.publish(Envelope::new(PARAMETER_INIT, json!("not json")));
        bus.publish(Envelope::new(PARAMETER_INIT, json!({"width": "1", "height": "2"})));

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("no update within timeout")
            .unwrap();
        assert_eq!(store.get(), ParameterConfig { width: 1.0, height: 2.0 });
    }
}
