//! Installed/not-installed gate for the managed binary.

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, TorError};

/// Caches whether the Tor binary can be found.
///
/// Every mutating operation calls [`require`](PresenceGate::require) first.
/// The cache is cleared with [`invalidate`](PresenceGate::invalidate) once an
/// install or uninstall completes.
#[derive(Debug)]
pub struct PresenceGate {
    binary: String,
    /// Search path override; `None` searches `$PATH`.
    search_path: Option<OsString>,
    cached: Option<bool>,
}

impl PresenceGate {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            search_path: None,
            cached: None,
        }
    }

    /// Look for the binary only in `search_path` (a `PATH`-style list).
    pub fn with_search_path(binary: impl Into<String>, search_path: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
            search_path: Some(search_path.into()),
            cached: None,
        }
    }

    /// Locate the binary without touching the cache.
    pub fn locate(&self) -> Option<PathBuf> {
        let found = match self.search_path {
            Some(ref paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which::which_in(&self.binary, Some(paths), cwd)
            }
            None => which::which(&self.binary),
        };
        found.ok()
    }

    pub fn is_present(&mut self, use_cache: bool) -> bool {
        if use_cache {
            if let Some(present) = self.cached {
                return present;
            }
        }

        let found = self.locate();
        debug!("{} lookup: {:?}", self.binary, found);
        let present = found.is_some();
        self.cached = Some(present);
        present
    }

    /// `Err(NotInstalled)` unless the binary is present.
    pub fn require(&mut self) -> Result<()> {
        if self.is_present(true) {
            Ok(())
        } else {
            Err(TorError::NotInstalled)
        }
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    fn install_fake_binary(dir: &std::path::Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_missing_binary_requires_install() {
        let dir = tempdir().unwrap();
        let mut gate = PresenceGate::with_search_path("tor", dir.path());

        assert!(!gate.is_present(true));
        assert!(matches!(gate.require(), Err(TorError::NotInstalled)));
    }

    #[cfg(unix)]
    #[test]
    fn test_cache_survives_until_invalidated() {
        let dir = tempdir().unwrap();
        let mut gate = PresenceGate::with_search_path("tor", dir.path());
        assert!(!gate.is_present(true));

        install_fake_binary(dir.path(), "tor");

        // Cached answer is stale until invalidated or bypassed
        assert!(!gate.is_present(true));
        assert!(gate.is_present(false));

        std::fs::remove_file(dir.path().join("tor")).unwrap();
        assert!(gate.is_present(true));
        gate.invalidate();
        assert!(!gate.is_present(true));
    }

    #[cfg(unix)]
    #[test]
    fn test_require_passes_when_present() {
        let dir = tempdir().unwrap();
        install_fake_binary(dir.path(), "tor");
        let mut gate = PresenceGate::with_search_path("tor", dir.path());

        assert!(gate.require().is_ok());
        assert!(gate.locate().is_some());
    }
}
