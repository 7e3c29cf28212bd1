use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use winbridge_common::{Envelope, EventBus};

use crate::protocol::InboundEvent;

use super::WindowCoordinator;

impl WindowCoordinator {
    /// Subscribe to the window control events on `bus`.
    ///
    /// Events are handled one at a time in arrival order by a single task.
    /// A failing handler is logged and the loop carries on; the task ends
    /// only when the bus is dropped.
    pub fn listen(&self, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let coordinator = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => coordinator.dispatch(envelope).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("window listener lagged by {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("event bus closed, window listener stopping");
                        break;
                    }
                }
            }
        })
    }

    async fn dispatch(&self, envelope: Envelope) {
        if !InboundEvent::is_window_event(&envelope.event) {
            return;
        }
        let event = match InboundEvent::from_envelope(&envelope) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(e) => {
                error!(event = %envelope.event, error = %e, "window event rejected");
                return;
            }
        };

        debug!(event = event.name(), window = %self.context.label, "dispatch");
        if let Err(e) = self.handle(event).await {
            warn!(event = %envelope.event, error = %e, "window event failed");
        }
    }
}
