//! Package manager capability and its apt implementation.

use crate::error::Result;
use crate::exec::{self, CommandOutput};
use crate::utils::privileged_command;

/// OS package manager operations used by install/update/uninstall.
pub trait PackageManager {
    /// Refresh the package index.
    fn update(&self) -> Result<CommandOutput>;

    fn install(&self, packages: &[&str]) -> Result<CommandOutput>;

    fn remove(&self, package: &str) -> Result<CommandOutput>;

    fn upgrade(&self, package: &str) -> Result<CommandOutput>;
}

/// Debian/Ubuntu `apt`, run through `sudo` when not root.
#[derive(Debug, Clone, Default)]
pub struct Apt;

impl Apt {
    fn apt(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = privileged_command("apt-get");
        cmd.args(args).env("DEBIAN_FRONTEND", "noninteractive");
        exec::run(&mut cmd)
    }
}

impl PackageManager for Apt {
    fn update(&self) -> Result<CommandOutput> {
        self.apt(&["update"])
    }

    fn install(&self, packages: &[&str]) -> Result<CommandOutput> {
        let mut args = vec!["install", "-y"];
        args.extend_from_slice(packages);
        self.apt(&args)
    }

    fn remove(&self, package: &str) -> Result<CommandOutput> {
        self.apt(&["remove", "-y", package])
    }

    fn upgrade(&self, package: &str) -> Result<CommandOutput> {
        // --only-upgrade keeps this from installing the package when absent
        self.apt(&["install", "-y", "--only-upgrade", package])
    }
}
