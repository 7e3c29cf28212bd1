//! Outbound side of the driver.
//!
//! Everything written to stdout goes through one bounded channel into the
//! reporter, so emitting waits for the reporter instead of dropping lines.
//! The reporter also prints window table and parameter changes.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use winbridge_common::{Envelope, HostError};
use winbridge_core::{EventEmitter, ParameterConfig, WindowRecord};

/// A message queued for stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Event(Envelope),
    Playboard(String),
}

/// One line written to stdout.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputLine<'a> {
    Event {
        event: &'a str,
        payload: &'a Value,
    },
    Playboard {
        content: &'a str,
    },
    Windows {
        windows: &'a [WindowRecord],
    },
    Parameters {
        width: f64,
        height: f64,
    },
}

impl OutputLine<'_> {
    pub fn render(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!("{{\"kind\":\"error\",\"error\":\"{e}\"}}"))
    }
}

impl Outbound {
    fn render(&self) -> String {
        match self {
            Self::Event(envelope) => OutputLine::Event {
                event: &envelope.event,
                payload: &envelope.payload,
            }
            .render(),
            Self::Playboard(content) => OutputLine::Playboard { content }.render(),
        }
    }
}

/// Emits window broadcasts into the outbound queue.
pub struct ChannelEmitter {
    tx: mpsc::Sender<Outbound>,
}

impl ChannelEmitter {
    pub fn new(tx: mpsc::Sender<Outbound>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventEmitter for ChannelEmitter {
    async fn emit(&self, event: &str, payload: Value) -> Result<(), HostError> {
        self.tx
            .send(Outbound::Event(Envelope::new(event, payload)))
            .await
            .map_err(|_| HostError::Emit(format!("output closed, `{event}` not delivered")))
    }
}

/// Worker for `tauri-playboard-init` payloads: logs each one and queues it
/// for stdout. Ends when the relay side is dropped.
pub fn spawn_playboard_worker(
    mut payloads: mpsc::Receiver<String>,
    outbound: mpsc::Sender<Outbound>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut count = 0;
        while let Some(content) = payloads.recv().await {
            tracing::info!(%content, "playboard payload redistributed");
            count += 1;
            if outbound.send(Outbound::Playboard(content)).await.is_err() {
                tracing::warn!("output closed, playboard worker stopping");
                break;
            }
        }
        count
    })
}

async fn write_line<W>(out: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Write outbound traffic and state changes to `out` until every outbound
/// sender is dropped. Returns the writer once everything queued is flushed.
pub fn spawn_reporter<W>(
    mut out: W,
    mut outbound: mpsc::Receiver<Outbound>,
    mut windows: watch::Receiver<Vec<WindowRecord>>,
    mut parameters: watch::Receiver<ParameterConfig>,
) -> JoinHandle<std::io::Result<W>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut windows_open = true;
        let mut parameters_open = true;
        loop {
            tokio::select! {
                message = outbound.recv() => match message {
                    Some(message) => write_line(&mut out, &message.render()).await?,
                    None => break,
                },
                changed = windows.changed(), if windows_open => {
                    if changed.is_err() {
                        windows_open = false;
                        continue;
                    }
                    let table = windows.borrow_and_update().clone();
                    write_line(&mut out, &OutputLine::Windows { windows: &table }.render()).await?;
                }
                changed = parameters.changed(), if parameters_open => {
                    if changed.is_err() {
                        parameters_open = false;
                        continue;
                    }
                    let config = *parameters.borrow_and_update();
                    let line = OutputLine::Parameters {
                        width: config.width,
                        height: config.height,
                    };
                    write_line(&mut out, &line.render()).await?;
                }
            }
        }

        // Changes made by the last handled events.
        if windows.has_changed().unwrap_or(false) {
            let table = windows.borrow_and_update().clone();
            write_line(&mut out, &OutputLine::Windows { windows: &table }.render()).await?;
        }
        if parameters.has_changed().unwrap_or(false) {
            let config = *parameters.borrow_and_update();
            let line = OutputLine::Parameters {
                width: config.width,
                height: config.height,
            };
            write_line(&mut out, &line.render()).await?;
        }
        out.flush().await?;
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use winbridge_common::{EventBus, WindowRole};
    use winbridge_core::{HeadlessHost, ParameterPayload, ParameterStore};

    fn lines(out: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(out)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn output_lines_are_tagged() {
        let payload = json!({"x": 1});
        let line = OutputLine::Event {
            event: "win-postdata",
            payload: &payload,
        };
        let value: Value = serde_json::from_str(&line.render()).unwrap();
        assert_eq!(
            value,
            json!({"kind": "event", "event": "win-postdata", "payload": {"x": 1}})
        );
    }

    #[test]
    fn nan_parameters_render_as_null() {
        let line = OutputLine::Parameters {
            width: f64::NAN,
            height: 600.0,
        };
        let value: Value = serde_json::from_str(&line.render()).unwrap();
        assert_eq!(value, json!({"kind": "parameters", "width": null, "height": 600.0}));
    }

    #[tokio::test]
    async fn emitter_waits_for_room_instead_of_dropping() {
        let (tx, mut rx) = mpsc::channel(1);
        let emitter = ChannelEmitter::new(tx);

        let send_all = async {
            for i in 0..10 {
                emitter.emit("win-postdata", json!(i)).await.unwrap();
            }
        };
        let receive_all = async {
            let mut seen = Vec::new();
            while seen.len() < 10 {
                if let Some(Outbound::Event(env)) = rx.recv().await {
                    seen.push(env.payload);
                }
            }
            seen
        };
        let ((), seen) = tokio::join!(send_all, receive_all);

        assert_eq!(seen, (0..10).map(|i| json!(i)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn emitter_reports_closed_output() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = ChannelEmitter::new(tx)
            .emit("win-postdata", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Emit(_)));
    }

    #[tokio::test]
    async fn reporter_flushes_everything_queued_before_close() {
        let host = HeadlessHost::new(EventBus::new(4));
        let store = ParameterStore::new();
        let (tx, rx) = mpsc::channel(4);
        let reporter = spawn_reporter(Vec::new(), rx, host.watch_windows(), store.subscribe());

        tx.send(Outbound::Event(Envelope::new("win-postdata", json!("P"))))
            .await
            .unwrap();
        tx.send(Outbound::Playboard("{\"mines\":3}".into()))
            .await
            .unwrap();
        host.open("main", WindowRole::Main);
        store.init(&ParameterPayload::new("640", "480"));
        drop(tx);

        let out = reporter.await.unwrap().unwrap();
        let lines = lines(&out);

        assert!(lines.contains(&json!({"kind": "event", "event": "win-postdata", "payload": "P"})));
        assert!(lines.contains(&json!({"kind": "playboard", "content": "{\"mines\":3}"})));
        let windows = lines.iter().find(|l| l["kind"] == "windows").unwrap();
        assert_eq!(windows["windows"][0]["label"], "main");
        assert!(lines.contains(&json!({"kind": "parameters", "width": 640.0, "height": 480.0})));
    }

    #[tokio::test]
    async fn playboard_worker_queues_payloads_for_output() {
        let (payload_tx, payload_rx) = mpsc::channel(2);
        let (out_tx, mut out_rx) = mpsc::channel(2);
        let worker = spawn_playboard_worker(payload_rx, out_tx);

        payload_tx.send("a".to_string()).await.unwrap();
        payload_tx.send("b".to_string()).await.unwrap();
        drop(payload_tx);

        assert_eq!(out_rx.recv().await, Some(Outbound::Playboard("a".into())));
        assert_eq!(out_rx.recv().await, Some(Outbound::Playboard("b".into())));
        assert_eq!(worker.await.unwrap(), 2);
        assert_eq!(out_rx.recv().await, None);
    }
}
