//! Host-side `tauri-playboard-init` relay.
//!
//! The host receives the event itself and hands the payload, as JSON text, to
//! a worker task over a bounded channel. What the worker does with it is up
//! to the receiver's owner.

use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use winbridge_common::{EventBus, HostError};

use crate::protocol::PLAYBOARD_INIT;

/// Sending half of the playboard channel. Cheap to clone.
#[derive(Clone)]
pub struct PlayboardRelay {
    tx: mpsc::Sender<String>,
}

impl PlayboardRelay {
    /// A relay and the worker's receiving end, holding up to `capacity`
    /// pending payloads.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Text handed to the worker: a string payload is passed through as is,
    /// anything else is serialized.
    pub fn payload_text(payload: &Value) -> String {
        match payload {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }

    /// Queue a payload for the worker, waiting while the channel is full.
    pub async fn forward(&self, payload: &Value) -> Result<(), HostError> {
        let content = Self::payload_text(payload);
        debug!(event = PLAYBOARD_INIT, %content, "playboard payload received");
        self.tx
            .send(content)
            .await
            .map_err(|_| HostError::Emit("playboard worker has stopped".into()))
    }

    /// Forward every `tauri-playboard-init` seen on `bus` until the bus or
    /// the worker goes away.
    pub fn listen(&self, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let relay = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) if envelope.event == PLAYBOARD_INIT => {
                        if let Err(e) = relay.forward(&envelope.payload).await {
                            warn!(error = %e, "playboard relay stopping");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("playboard listener lagged by {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
