//! Root detection for commands that modify the system.

use std::process::Command;

/// Check if the current process runs as root.
#[cfg(unix)]
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Build a command for `program`, prefixed with `sudo` when not root.
pub fn privileged_command(program: &str) -> Command {
    if is_root() || cfg!(not(unix)) {
        Command::new(program)
    } else {
        let mut cmd = Command::new("sudo");
        cmd.arg(program);
        cmd
    }
}
