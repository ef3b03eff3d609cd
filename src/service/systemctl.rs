//! systemd-backed service manager.

use super::{ServiceAction, ServiceManager};
use crate::error::Result;
use crate::exec::{self, CommandOutput};
use crate::utils::privileged_command;

/// Drives services through `systemctl`, via `sudo` when not root.
#[derive(Debug, Clone, Default)]
pub struct Systemctl;

impl ServiceManager for Systemctl {
    fn run(&self, action: ServiceAction, service: &str) -> Result<CommandOutput> {
        let mut cmd = privileged_command("systemctl");
        cmd.arg(action.as_str()).arg(service);
        if action == ServiceAction::Status {
            // Keep status output plain when captured
            cmd.arg("--no-pager");
        }
        exec::run(&mut cmd)
    }

    fn active_state(&self, service: &str) -> Result<CommandOutput> {
        // is-active needs no privileges
        exec::run(std::process::Command::new("systemctl").args(["is-active", service]))
    }
}
