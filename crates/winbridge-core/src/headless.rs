//! In-memory host: a window table, a call log and an event bus.
//!
//! Every asynchronous operation yields to the scheduler once before touching
//! state, so concurrent callers interleave the way they would against a real
//! window manager.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;
use winbridge_common::{Envelope, EventBus, HostError, Label, WindowHandle, WindowRole};

use crate::host::{EventEmitter, ProcessControl, WindowManager};
use crate::protocol::{WindowCreateRequest, WindowOptions};

/// One call made against the host, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    Create { label: Label },
    Close { label: Label },
    Show { label: Label },
    Hide { label: Label },
    Unminimize { label: Label },
    Focus { label: Label },
    Maximize { label: Label },
    Emit { event: String, payload: Value },
    Exit { code: i32 },
    Relaunch,
}

impl HostCall {
    /// Name of the host operation, as used in [`HostError::Operation`].
    pub fn op(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Close { .. } => "close",
            Self::Show { .. } => "show",
            Self::Hide { .. } => "hide",
            Self::Unminimize { .. } => "unminimize",
            Self::Focus { .. } => "set_focus",
            Self::Maximize { .. } => "maximize",
            Self::Emit { .. } => "emit",
            Self::Exit { .. } => "exit",
            Self::Relaunch => "relaunch",
        }
    }
}

/// State of one window in the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRecord {
    pub label: Label,
    pub role: WindowRole,
    pub options: WindowOptions,
    pub visible: bool,
    pub minimized: bool,
    pub focused: bool,
    pub maximized: bool,
}

impl WindowRecord {
    fn handle(&self) -> WindowHandle {
        WindowHandle::new(self.label.clone(), self.role)
    }
}

#[derive(Default)]
struct HostState {
    windows: Vec<WindowRecord>,
    calls: Vec<HostCall>,
    failures: HashMap<Label, String>,
    op_failures: HashMap<(&'static str, Label), String>,
}

impl HostState {
    fn window_mut(&mut self, label: &Label) -> Result<&mut WindowRecord, HostError> {
        self.windows
            .iter_mut()
            .find(|w| &w.label == label)
            .ok_or_else(|| HostError::WindowNotFound(label.to_string()))
    }

    fn focus_only(&mut self, label: &Label) {
        for w in &mut self.windows {
            w.focused = &w.label == label;
        }
    }
}

#[derive(Clone)]
pub struct HeadlessHost {
    state: Arc<Mutex<HostState>>,
    table: Arc<watch::Sender<Vec<WindowRecord>>>,
    bus: EventBus,
}

impl HeadlessHost {
    /// A host with no windows that emits onto `bus`.
    pub fn new(bus: EventBus) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState::default())),
            table: Arc::new(watch::channel(Vec::new()).0),
            bus,
        }
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the window table to watchers if it differs from the last one.
    fn commit(&self, state: &HostState) {
        self.table.send_if_modified(|table| {
            if *table == state.windows {
                return false;
            }
            table.clone_from(&state.windows);
            true
        });
    }

    /// Observe the window table. The receiver sees the latest table after
    /// every change; intermediate states may be coalesced.
    pub fn watch_windows(&self) -> watch::Receiver<Vec<WindowRecord>> {
        self.table.subscribe()
    }

    /// Put a window in the table without recording a call, as if it had been
    /// opened before the coordinator started.
    pub fn open(&self, label: impl Into<Label>, role: WindowRole) {
        let label = label.into();
        let mut state = self.state();
        state.windows.retain(|w| w.label != label);
        state.windows.push(WindowRecord {
            label,
            role,
            options: WindowOptions::default(),
            visible: true,
            minimized: false,
            focused: false,
            maximized: false,
        });
        self.commit(&state);
    }

    /// Simulate the user minimizing a window.
    pub fn minimize(&self, label: &Label) -> Result<(), HostError> {
        let mut state = self.state();
        let window = state.window_mut(label)?;
        window.minimized = true;
        window.focused = false;
        self.commit(&state);
        Ok(())
    }

    /// Make the next creation of `label` fail with `reason`.
    pub fn fail_creation_of(&self, label: impl Into<Label>, reason: impl Into<String>) {
        self.state().failures.insert(label.into(), reason.into());
    }

    /// Make the next `op` (e.g. `"maximize"`) on `label` fail with `reason`.
    pub fn fail_operation(
        &self,
        op: &'static str,
        label: impl Into<Label>,
        reason: impl Into<String>,
    ) {
        self.state()
            .op_failures
            .insert((op, label.into()), reason.into());
    }

    pub fn windows(&self) -> Vec<WindowRecord> {
        self.state().windows.clone()
    }

    pub fn window(&self, label: &Label) -> Option<WindowRecord> {
        self.state().windows.iter().find(|w| &w.label == label).cloned()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }

    fn apply(
        &self,
        call: HostCall,
        label: &Label,
        op: impl FnOnce(&mut HostState) -> Result<(), HostError>,
    ) -> Result<(), HostError> {
        let mut state = self.state();
        let name = call.op();
        state.calls.push(call);
        state.window_mut(label)?;
        if let Some(reason) = state.op_failures.remove(&(name, label.clone())) {
            return Err(HostError::Operation {
                op: name,
                label: label.to_string(),
                reason,
            });
        }
        op(&mut *state)?;
        self.commit(&state);
        debug!(label = %label, "host window updated");
        Ok(())
    }
}

#[async_trait]
impl WindowManager for HeadlessHost {
    async fn get_window(&self, label: &Label) -> Option<WindowHandle> {
        tokio::task::yield_now().await;
        self.state()
            .windows
            .iter()
            .find(|w| &w.label == label)
            .map(WindowRecord::handle)
    }

    async fn all_windows(&self) -> Vec<WindowHandle> {
        tokio::task::yield_now().await;
        self.state().windows.iter().map(WindowRecord::handle).collect()
    }

    async fn create_window(
        &self,
        request: &WindowCreateRequest,
    ) -> Result<WindowHandle, HostError> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.calls.push(HostCall::Create {
            label: request.label.clone(),
        });

        if let Some(reason) = state.failures.remove(&request.label) {
            return Err(HostError::CreationFailed {
                label: request.label.to_string(),
                reason,
            });
        }
        if state.windows.iter().any(|w| w.label == request.label) {
            return Err(HostError::CreationFailed {
                label: request.label.to_string(),
                reason: "a window with the same label already exists".into(),
            });
        }

        // The initial maximized flag is not applied; callers maximize explicitly.
        let record = WindowRecord {
            label: request.label.clone(),
            role: request.role,
            options: request.options.clone(),
            visible: request.options.visible.unwrap_or(true),
            minimized: false,
            focused: false,
            maximized: false,
        };
        let handle = record.handle();
        state.windows.push(record);
        state.focus_only(&request.label);
        self.commit(&state);
        debug!(label = %request.label, "host window created");
        Ok(handle)
    }

    async fn close(&self, label: &Label) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        let call = HostCall::Close {
            label: label.clone(),
        };
        self.apply(call, label, |state| {
            state.windows.retain(|w| &w.label != label);
            Ok(())
        })
    }

    async fn show(&self, label: &Label) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        let call = HostCall::Show {
            label: label.clone(),
        };
        self.apply(call, label, |state| {
            state.window_mut(label)?.visible = true;
            Ok(())
        })
    }

    async fn hide(&self, label: &Label) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        let call = HostCall::Hide {
            label: label.clone(),
        };
        self.apply(call, label, |state| {
            let window = state.window_mut(label)?;
            window.visible = false;
            window.focused = false;
            Ok(())
        })
    }

    async fn unminimize(&self, label: &Label) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        let call = HostCall::Unminimize {
            label: label.clone(),
        };
        self.apply(call, label, |state| {
            state.window_mut(label)?.minimized = false;
            Ok(())
        })
    }

    async fn set_focus(&self, label: &Label) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        let call = HostCall::Focus {
            label: label.clone(),
        };
        self.apply(call, label, |state| {
            state.focus_only(label);
            Ok(())
        })
    }

    async fn maximize(&self, label: &Label) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        let call = HostCall::Maximize {
            label: label.clone(),
        };
        self.apply(call, label, |state| {
            let window = state.window_mut(label)?;
            if !window.options.resizable {
                return Err(HostError::Operation {
                    op: "maximize",
                    label: label.to_string(),
                    reason: "window is not resizable".into(),
                });
            }
            window.maximized = true;
            Ok(())
        })
    }
}

#[async_trait]
impl EventEmitter for HeadlessHost {
    async fn emit(&self, event: &str, payload: Value) -> Result<(), HostError> {
        self.state().calls.push(HostCall::Emit {
            event: event.to_string(),
            payload: payload.clone(),
        });
        let receivers = self.bus.publish(Envelope::new(event, payload));
        debug!(event, receivers, "emitted");
        Ok(())
    }
}

#[async_trait]
impl ProcessControl for HeadlessHost {
    async fn exit(&self, code: i32) -> Result<(), HostError> {
        self.state().calls.push(HostCall::Exit { code });
        Ok(())
    }

    async fn relaunch(&self) -> Result<(), HostError> {
        self.state().calls.push(HostCall::Relaunch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(label: &str) -> WindowCreateRequest {
        WindowCreateRequest::new(label, WindowRole::Secondary, WindowOptions::default())
    }

    #[tokio::test]
    async fn create_then_lookup() {
        let host = HeadlessHost::new(EventBus::new(8));
        let handle = host.create_window(&request("about")).await.unwrap();

        assert_eq!(handle, WindowHandle::new("about", WindowRole::Secondary));
        assert_eq!(host.get_window(&"about".into()).await, Some(handle));
        assert!(host.window(&"about".into()).unwrap().focused);
    }

    #[tokio::test]
    async fn duplicate_label_fails_creation() {
        let host = HeadlessHost::new(EventBus::new(8));
        host.open("about", WindowRole::Secondary);

        let err = host.create_window(&request("about")).await.unwrap_err();
        assert!(matches!(err, HostError::CreationFailed { .. }));
        assert_eq!(host.windows().len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_is_one_shot() {
        let host = HeadlessHost::new(EventBus::new(8));
        host.fail_creation_of("about", "gpu lost");

        let err = host.create_window(&request("about")).await.unwrap_err();
        assert!(err.to_string().contains("gpu lost"));
        assert!(host.create_window(&request("about")).await.is_ok());
    }

    #[tokio::test]
    async fn operations_on_missing_window_fail() {
        let host = HeadlessHost::new(EventBus::new(8));
        let err = host.set_focus(&"ghost".into()).await.unwrap_err();
        assert!(matches!(err, HostError::WindowNotFound(ref l) if l == "ghost"));
        assert_eq!(host.calls(), vec![HostCall::Focus { label: "ghost".into() }]);
    }

    #[tokio::test]
    async fn show_hide_and_minimize_track_state() {
        let host = HeadlessHost::new(EventBus::new(8));
        host.open("main", WindowRole::Main);
        let label = Label::new("main");

        host.hide(&label).await.unwrap();
        assert!(!host.window(&label).unwrap().visible);

        host.minimize(&label).unwrap();
        host.show(&label).await.unwrap();
        host.unminimize(&label).await.unwrap();
        let record = host.window(&label).unwrap();
        assert!(record.visible);
        assert!(!record.minimized);
    }

    #[tokio::test]
    async fn emit_records_and_publishes() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let host = HeadlessHost::new(bus);

        host.emit("win-postdata", json!({"a": 1})).await.unwrap();

        assert_eq!(
            host.calls(),
            vec![HostCall::Emit {
                event: "win-postdata".into(),
                payload: json!({"a": 1}),
            }]
        );
        assert_eq!(rx.recv().await.unwrap().payload, json!({"a": 1}));
    }

    #[tokio::test]
    async fn window_table_watchers_see_changes() {
        let host = HeadlessHost::new(EventBus::new(8));
        let mut rx = host.watch_windows();
        assert!(rx.borrow().is_empty());

        host.create_window(&request("about")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        // Focusing the already focused window changes nothing.
        host.set_focus(&"about".into()).await.unwrap();
        assert!(!rx.has_changed().unwrap());

        host.close(&"about".into()).await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn injected_operation_failure_is_one_shot() {
        let host = HeadlessHost::new(EventBus::new(8));
        host.open("main", WindowRole::Main);
        host.fail_operation("hide", "main", "compositor busy");
        let label = Label::new("main");

        let err = host.hide(&label).await.unwrap_err();
        assert!(matches!(err, HostError::Operation { op: "hide", .. }));
        assert!(host.window(&label).unwrap().visible);

        host.hide(&label).await.unwrap();
        assert!(!host.window(&label).unwrap().visible);
    }

    #[test]
    fn host_call_serializes_tagged() {
        let json = serde_json::to_value(HostCall::Focus { label: "x".into() }).unwrap();
        assert_eq!(json, json!({"call": "focus", "label": "x"}));
        let json = serde_json::to_value(HostCall::Relaunch).unwrap();
        assert_eq!(json, json!({"call": "relaunch"}));
    }
}
