//! Inbound side of the driver.
//!
//! One JSON envelope per stdin line (`{"event": "...", "payload": ...}`) is
//! queued on a bounded channel and handled by a single dispatcher, in input
//! order. A full queue makes the reader wait; nothing is dropped.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use winbridge_common::Envelope;
use winbridge_core::{InboundEvent, ParameterStore, PlayboardRelay, WindowCoordinator};

use crate::process::ShutdownRequest;

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Envelope>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Queue every envelope read from `reader` until end of input or until the
/// dispatcher goes away. Returns the number of envelopes queued.
pub async fn pump<R>(reader: R, queue: mpsc::Sender<Envelope>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut queued = 0;
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line) {
            Ok(Some(envelope)) => {
                tracing::debug!(line = line_no, event = %envelope.event, "input envelope");
                if queue.send(envelope).await.is_err() {
                    tracing::debug!(line = line_no, "dispatcher stopped, no more input read");
                    break;
                }
                queued += 1;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping malformed input line");
            }
        }
    }
    Ok(queued)
}

/// Routes decoded events to the parameter store, the playboard relay or the
/// window coordinator.
pub struct Dispatcher {
    store: ParameterStore,
    coordinator: WindowCoordinator,
    playboard: PlayboardRelay,
}

impl Dispatcher {
    pub fn new(
        store: ParameterStore,
        coordinator: WindowCoordinator,
        playboard: PlayboardRelay,
    ) -> Self {
        Self {
            store,
            coordinator,
            playboard,
        }
    }

    /// Handle one envelope to completion.
    pub async fn dispatch(&self, envelope: Envelope) {
        let event = match InboundEvent::from_envelope(&envelope) {
            Ok(Some(event)) => event,
            Ok(None) => {
                tracing::debug!(event = %envelope.event, "no handler, ignored");
                return;
            }
            Err(e) => {
                tracing::error!(event = %envelope.event, error = %e, "rejected payload");
                return;
            }
        };

        let name = event.name();
        match event {
            InboundEvent::ParameterInit(payload) => self.store.init(&payload),
            InboundEvent::PlayboardInit(payload) => {
                if let Err(e) = self.playboard.forward(&payload).await {
                    tracing::warn!(event = name, error = %e, "playboard payload not delivered");
                }
            }
            other => {
                if let Err(e) = self.coordinator.handle(other).await {
                    tracing::warn!(event = name, error = %e, "window event failed");
                }
            }
        }
    }

    /// Drain `queue` until it closes or a shutdown is requested. Input still
    /// queued after a shutdown request is discarded. Returns the number of
    /// envelopes handled.
    pub fn spawn(
        self,
        mut queue: mpsc::Receiver<Envelope>,
        shutdown: watch::Receiver<Option<ShutdownRequest>>,
    ) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut handled = 0;
            while let Some(envelope) = queue.recv().await {
                self.dispatch(envelope).await;
                handled += 1;
                if let Some(request) = *shutdown.borrow() {
                    tracing::info!(?request, handled, "dispatcher stopping");
                    break;
                }
            }
            handled
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use serde_json::{json, Value};
    use winbridge_common::{EventBus, WindowRole};
    use winbridge_core::protocol::{
        PARAMETER_INIT, PLAYBOARD_INIT, WIN_CREATE, WIN_EXIT, WIN_POSTDATA, WIN_SETDATA,
    };
    use winbridge_core::{CoordinatorOptions, HeadlessHost, WindowContext};

    use crate::output::{spawn_playboard_worker, ChannelEmitter, Outbound};
    use crate::process::SystemProcess;

    const QUEUE: usize = 8;

    struct Harness {
        host: HeadlessHost,
        store: ParameterStore,
        shutdown: watch::Receiver<Option<ShutdownRequest>>,
        queue: mpsc::Sender<Envelope>,
        dispatcher: JoinHandle<usize>,
        collector: JoinHandle<Vec<Outbound>>,
    }

    /// Wires the binary's pipeline with small queues and collects the
    /// outbound side instead of printing it.
    fn harness() -> Harness {
        let host = HeadlessHost::new(EventBus::new(QUEUE));
        host.open("main", WindowRole::Main);
        let store = ParameterStore::new();
        let (shutdown_tx, shutdown) = watch::channel(None);
        let (out_tx, mut out_rx) = mpsc::channel(QUEUE);
        let (playboard, playboard_rx) = PlayboardRelay::channel(QUEUE);
        let _worker = spawn_playboard_worker(playboard_rx, out_tx.clone());

        let coordinator = WindowCoordinator::new(
            WindowContext::new("main", WindowRole::Main),
            CoordinatorOptions::default(),
            Arc::new(host.clone()),
            Arc::new(ChannelEmitter::new(out_tx)),
            Arc::new(SystemProcess::new(shutdown_tx)),
        );
        let (queue, queue_rx) = mpsc::channel(QUEUE);
        let dispatcher = Dispatcher::new(store.clone(), coordinator, playboard)
            .spawn(queue_rx, shutdown.clone());
        let collector = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(message) = out_rx.recv().await {
                seen.push(message);
            }
            seen
        });

        Harness {
            host,
            store,
            shutdown,
            queue,
            dispatcher,
            collector,
        }
    }

    fn input(envelopes: impl IntoIterator<Item = Envelope>) -> String {
        envelopes
            .into_iter()
            .map(|e| serde_json::to_string(&e).unwrap() + "\n")
            .collect()
    }

    fn postdata(seen: &[Outbound]) -> Vec<Value> {
        seen.iter()
            .filter_map(|m| match m {
                Outbound::Event(env) if env.event == WIN_POSTDATA => Some(env.payload.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parses_envelope_lines() {
        let env = parse_line(r#"{"event":"tauri-win-show"}"#).unwrap().unwrap();
        assert_eq!(env, Envelope::signal("tauri-win-show"));

        let env = parse_line(r#"  {"event":"tauri-win-setdata","payload":[1]}  "#)
            .unwrap()
            .unwrap();
        assert_eq!(env.payload, json!([1]));
    }

    #[test]
    fn blank_lines_are_skipped_and_garbage_is_an_error() {
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("{oops").is_err());
        assert!(parse_line(r#"{"payload": 1}"#).is_err());
    }

    #[tokio::test]
    async fn pump_queues_valid_lines_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let input = b"{\"event\":\"a\"}\nnot json\n\n{\"event\":\"b\",\"payload\":2}\n";

        let queued = pump(&input[..], tx).await.unwrap();

        assert_eq!(queued, 2);
        assert_eq!(rx.recv().await.unwrap().event, "a");
        assert_eq!(rx.recv().await.unwrap(), Envelope::new("b", json!(2)));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn pump_stops_when_the_queue_closes() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let queued = pump(&b"{\"event\":\"a\"}\n{\"event\":\"b\"}\n"[..], tx)
            .await
            .unwrap();
        assert_eq!(queued, 0);
    }

    #[tokio::test]
    async fn every_setdata_is_relayed_when_input_outruns_the_queue() {
        let h = harness();
        let lines = input((0..500).map(|i| Envelope::new(WIN_SETDATA, json!(i))));

        let queued = pump(lines.as_bytes(), h.queue).await.unwrap();
        let handled = h.dispatcher.await.unwrap();
        let seen = h.collector.await.unwrap();

        assert_eq!(queued, 500);
        assert_eq!(handled, 500);
        assert_eq!(postdata(&seen), (0..500).map(|i| json!(i)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn every_create_lands_when_input_outruns_the_queue() {
        let h = harness();
        let lines = input(
            (0..200).map(|i| Envelope::new(WIN_CREATE, json!({ "label": format!("w{i}") }))),
        );

        pump(lines.as_bytes(), h.queue).await.unwrap();
        assert_eq!(h.dispatcher.await.unwrap(), 200);

        assert_eq!(h.host.windows().len(), 201);
    }

    #[tokio::test]
    async fn exit_stops_dispatch_after_earlier_output_is_queued() {
        let h = harness();
        let lines = input([
            Envelope::new(WIN_SETDATA, json!("before")),
            Envelope::signal(WIN_EXIT),
            Envelope::new(WIN_SETDATA, json!("after")),
        ]);

        // The dispatcher may stop before the last line is queued.
        let _ = pump(lines.as_bytes(), h.queue).await.unwrap();
        let handled = h.dispatcher.await.unwrap();
        let seen = h.collector.await.unwrap();

        assert_eq!(handled, 2);
        assert_eq!(postdata(&seen), vec![json!("before")]);
        assert_eq!(*h.shutdown.borrow(), Some(ShutdownRequest::Exit(0)));
    }

    #[tokio::test]
    async fn parameter_and_playboard_events_reach_their_handlers() {
        let h = harness();
        let lines = input([
            Envelope::new(PARAMETER_INIT, json!({"width": "1024", "height": 768})),
            Envelope::new(PLAYBOARD_INIT, json!({"mines": 10})),
            Envelope::new(WIN_CREATE, json!("{not json")),
            Envelope::signal("someone-else"),
        ]);

        pump(lines.as_bytes(), h.queue).await.unwrap();
        assert_eq!(h.dispatcher.await.unwrap(), 4);
        let seen = h.collector.await.unwrap();

        let params = h.store.get();
        assert_eq!(params.width, 1024.0);
        assert_eq!(params.height, 768.0);
        assert_eq!(seen, vec![Outbound::Playboard(r#"{"mines":10}"#.into())]);
        assert_eq!(h.host.windows().len(), 1);
    }
}
