use serde_json::Value;
use tracing::{debug, info, warn};
use winbridge_common::{new_correlation_id, BridgeError, WindowHandle};

use crate::protocol::{InboundEvent, WindowCreateRequest, WIN_POSTDATA};

use super::types::{CreateOutcome, GuardOutcome};
use super::WindowCoordinator;

impl WindowCoordinator {
    /// Create a window, or reuse the one already holding the label.
    ///
    /// An open secondary window is unminimized and focused instead of being
    /// rebuilt. An open main window is closed and rebuilt. A new window that
    /// asks to be both maximized and resizable is maximized explicitly after
    /// construction. Lookup, close and create failures are returned to the
    /// caller; a failed maximize is only logged.
    pub async fn create_or_reuse(
        &self,
        request: WindowCreateRequest,
    ) -> Result<CreateOutcome, BridgeError> {
        let cid = new_correlation_id();
        let _guard = if self.options.serialize_by_label {
            Some(self.locks.acquire(&request.label).await)
        } else {
            None
        };

        debug!(cid = %cid, label = %request.label, role = %request.role, "create request");

        let replacing = match self.windows.get_window(&request.label).await {
            Some(existing) if !existing.role.is_main() => {
                self.bring_to_front(&existing).await?;
                info!(cid = %cid, label = %existing.label, "window already open, focused");
                return Ok(CreateOutcome::Focused(existing));
            }
            Some(existing) => {
                self.windows.close(&existing.label).await?;
                info!(cid = %cid, label = %existing.label, "closed main window for replacement");
                true
            }
            None => false,
        };

        let handle = match self.windows.create_window(&request).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(cid = %cid, label = %request.label, error = %e, "window create error");
                return Err(e.into());
            }
        };

        // The window exists from here on; a failed maximize does not undo that.
        if request.options.maximized && request.options.resizable {
            if let Err(e) = self.windows.maximize(&handle.label).await {
                warn!(cid = %cid, label = %handle.label, error = %e, "maximize after create failed");
            }
        }

        info!(cid = %cid, label = %handle.label, role = %handle.role, "window created");
        Ok(if replacing {
            CreateOutcome::Replaced(handle)
        } else {
            CreateOutcome::Created(handle)
        })
    }

    async fn bring_to_front(&self, window: &WindowHandle) -> Result<(), BridgeError> {
        self.windows.unminimize(&window.label).await?;
        self.windows.set_focus(&window.label).await?;
        Ok(())
    }

    /// Show, unminimize and focus this coordinator's own window, if it is main.
    pub async fn show_current(&self) -> Result<GuardOutcome, BridgeError> {
        if !self.context.role.is_main() {
            debug!(label = %self.context.label, "show ignored: not the main window");
            return Ok(GuardOutcome::Skipped);
        }
        let label = &self.context.label;
        self.windows.show(label).await?;
        self.windows.unminimize(label).await?;
        self.windows.set_focus(label).await?;
        Ok(GuardOutcome::Applied)
    }

    /// Hide this coordinator's own window, if it is main.
    pub async fn hide_current(&self) -> Result<GuardOutcome, BridgeError> {
        if !self.context.role.is_main() {
            debug!(label = %self.context.label, "hide ignored: not the main window");
            return Ok(GuardOutcome::Skipped);
        }
        self.windows.hide(&self.context.label).await?;
        Ok(GuardOutcome::Applied)
    }

    /// Rebroadcast a payload to every window as `win-postdata`, unchanged.
    pub async fn relay_data(&self, payload: Value) -> Result<(), BridgeError> {
        self.emitter.emit(WIN_POSTDATA, payload).await?;
        Ok(())
    }

    pub async fn exit(&self) -> Result<(), BridgeError> {
        info!("exit requested");
        self.process.exit(0).await?;
        Ok(())
    }

    pub async fn relaunch(&self) -> Result<(), BridgeError> {
        info!("relaunch requested");
        self.process.relaunch().await?;
        Ok(())
    }

    /// Handle one inbound event. `parameter-init` and `tauri-playboard-init`
    /// belong to the parameter store and the playboard relay and are ignored
    /// here.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), BridgeError> {
        match event {
            InboundEvent::Create(payload) => {
                let request = payload.into_request(&self.options.main_label);
                self.create_or_reuse(request).await?;
            }
            InboundEvent::Show => {
                self.show_current().await?;
            }
            InboundEvent::Hide => {
                self.hide_current().await?;
            }
            InboundEvent::Exit => self.exit().await?,
            InboundEvent::Relaunch => self.relaunch().await?,
            InboundEvent::SetData(payload) => self.relay_data(payload).await?,
            InboundEvent::ParameterInit(_) | InboundEvent::PlayboardInit(_) => {}
        }
        Ok(())
    }
}
