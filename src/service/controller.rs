//! Precondition-gated service control with normalized results.

use tracing::{error, info};

use super::{ServiceAction, ServiceManager, ServiceState};
use crate::error::{Result, TorError};
use crate::presence::PresenceGate;

/// Successful result of [`ServiceController::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    /// A state-changing action exited successfully.
    Done,
    /// Raw status text, not interpreted as success or failure.
    Status(String),
}

/// Outcomes of an identity rotation (reload followed by restart).
#[derive(Debug)]
pub struct RotationReport {
    pub reload: Result<ServiceOutcome>,
    pub restart: Result<ServiceOutcome>,
}

impl RotationReport {
    /// Whether the restart, the step that actually rotates circuits, succeeded.
    pub fn restarted(&self) -> bool {
        self.restart.is_ok()
    }
}

/// Applies service actions once the Tor binary is known to be present.
pub struct ServiceController {
    service_name: String,
    manager: Box<dyn ServiceManager>,
}

impl ServiceController {
    pub fn new(service_name: impl Into<String>, manager: Box<dyn ServiceManager>) -> Self {
        Self {
            service_name: service_name.into(),
            manager,
        }
    }

    /// Run one action. No retries; failures are reported once.
    pub fn apply(&self, gate: &mut PresenceGate, action: ServiceAction) -> Result<ServiceOutcome> {
        gate.require()?;

        let output = match self.manager.run(action, &self.service_name) {
            Ok(output) => output,
            Err(e) => {
                error!("{} {} failed: {}", self.service_name, action, e);
                return Err(e);
            }
        };

        if action == ServiceAction::Status {
            return Ok(ServiceOutcome::Status(output.text().to_string()));
        }

        if output.success {
            info!("{} {} OK", self.service_name, action);
            Ok(ServiceOutcome::Done)
        } else {
            let diagnostic = output.diagnostic();
            error!("{} {} failed: {}", self.service_name, action, diagnostic);
            Err(TorError::CommandFailed(diagnostic))
        }
    }

    /// Reload then restart. Both steps run even if the reload fails.
    pub fn rotate(&self, gate: &mut PresenceGate) -> Result<RotationReport> {
        gate.require()?;
        let reload = self.apply(gate, ServiceAction::Reload);
        let restart = self.apply(gate, ServiceAction::Restart);
        Ok(RotationReport { reload, restart })
    }

    /// Derive the current lifecycle state from the OS.
    pub fn state(&self, gate: &mut PresenceGate) -> ServiceState {
        if !gate.is_present(true) {
            return ServiceState::NotInstalled;
        }
        match self.manager.active_state(&self.service_name) {
            Ok(output) if output.success => ServiceState::Running,
            Ok(output) => match output.stdout.trim() {
                "inactive" | "failed" | "deactivating" => ServiceState::Stopped,
                _ => ServiceState::Unknown,
            },
            Err(_) => ServiceState::Unknown,
        }
    }
}
