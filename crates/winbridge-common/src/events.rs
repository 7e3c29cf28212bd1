use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A named, payload-bearing message travelling between the host and windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    /// An envelope with no payload (`null`), used for control signals.
    pub fn signal(event: impl Into<String>) -> Self {
        Self::new(event, serde_json::Value::Null)
    }
}

/// In-process pub/sub bus. Every subscriber sees every envelope, in publish order.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Envelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Publish an envelope. Returns the number of subscribers that will see it.
    pub fn publish(&self, envelope: Envelope) -> usize {
        tracing::trace!(event = %envelope.event, "publish");
        self.sender.send(envelope).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
