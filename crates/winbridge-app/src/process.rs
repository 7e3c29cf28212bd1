//! Process control for the real binary.
//!
//! Exit and relaunch requests are only recorded here. `main` acts on them
//! once the dispatcher has stopped and the reporter has flushed its output.

use std::process::Command;

use async_trait::async_trait;
use tokio::sync::watch;
use winbridge_common::HostError;
use winbridge_core::ProcessControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownRequest {
    Exit(i32),
    Relaunch,
}

/// Records the first exit or relaunch request on a watch channel.
pub struct SystemProcess {
    shutdown: watch::Sender<Option<ShutdownRequest>>,
}

impl SystemProcess {
    pub fn new(shutdown: watch::Sender<Option<ShutdownRequest>>) -> Self {
        Self { shutdown }
    }

    fn request(&self, request: ShutdownRequest) {
        let accepted = self.shutdown.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(request);
            true
        });
        if accepted {
            tracing::info!(?request, "shutdown requested");
        } else {
            tracing::debug!(?request, "shutdown already pending, ignored");
        }
    }
}

#[async_trait]
impl ProcessControl for SystemProcess {
    async fn exit(&self, code: i32) -> Result<(), HostError> {
        self.request(ShutdownRequest::Exit(code));
        Ok(())
    }

    async fn relaunch(&self) -> Result<(), HostError> {
        self.request(ShutdownRequest::Relaunch);
        Ok(())
    }
}

/// Spawn a fresh copy of the current executable with the same arguments.
fn spawn_copy() -> Result<u32, HostError> {
    let exe = std::env::current_exe()
        .map_err(|e| HostError::Process(format!("cannot locate executable: {e}")))?;
    let child = Command::new(&exe)
        .args(std::env::args_os().skip(1))
        .spawn()
        .map_err(|e| HostError::Process(format!("failed to spawn {}: {e}", exe.display())))?;
    Ok(child.id())
}

/// Carry out a shutdown request. Never returns.
pub fn terminate(request: ShutdownRequest) -> ! {
    match request {
        ShutdownRequest::Exit(code) => {
            tracing::info!(code, "exiting");
            std::process::exit(code)
        }
        ShutdownRequest::Relaunch => match spawn_copy() {
            Ok(pid) => {
                tracing::info!(pid, "relaunched, exiting");
                std::process::exit(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "relaunch failed");
                std::process::exit(1)
            }
        },
    }
}
