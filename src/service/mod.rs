//! Service lifecycle control.
//!
//! [`ServiceManager`] is the narrow OS capability (systemd in production,
//! recording fakes in tests). [`ServiceController`] layers the installed
//! precondition and result normalization on top of it.

mod controller;
mod systemctl;

pub use controller::{RotationReport, ServiceController, ServiceOutcome};
pub use systemctl::Systemctl;

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TorError};
use crate::exec::CommandOutput;

/// Actions the service manager understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Reload,
    Status,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Reload => "reload",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceAction {
    type Err = TorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            "reload" => Ok(Self::Reload),
            "status" => Ok(Self::Status),
            other => Err(TorError::InvalidInput(format!(
                "unknown service action: {}",
                other
            ))),
        }
    }
}

/// Service state derived from the OS on demand; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    NotInstalled,
    Stopped,
    Running,
    Unknown,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInstalled => "not installed",
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS service manager capability.
pub trait ServiceManager {
    /// Run `action` against `service`. A non-zero exit is not an `Err`.
    fn run(&self, action: ServiceAction, service: &str) -> Result<CommandOutput>;

    /// Query whether `service` is active (`systemctl is-active` semantics).
    fn active_state(&self, service: &str) -> Result<CommandOutput>;
}
