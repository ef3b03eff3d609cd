//! Cached read / idempotent write access to the torrc file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::document::{ConfigDocument, DirectiveKey, TorrcSnapshot};
use crate::error::{Result, TorError};
use crate::utils::replace_file;

/// Reads and rewrites the `SocksPort` / `ExitNodes` directives of a torrc.
///
/// The parsed snapshot is cached after the first successful read and dropped
/// whenever a write lands on disk (or the owner calls [`invalidate`]).
///
/// [`invalidate`]: ConfigStore::invalidate
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    cache: Option<TorrcSnapshot>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current directive values, never failing.
    ///
    /// A missing or unreadable torrc yields an empty snapshot; the file may
    /// legitimately not exist before Tor is installed.
    pub fn read(&mut self) -> TorrcSnapshot {
        match self.try_read() {
            Ok(snapshot) => snapshot,
            Err(TorError::NotFound(path)) => {
                warn!("torrc not found at {}", path.display());
                TorrcSnapshot::default()
            }
            Err(e) => {
                error!("Failed to read torrc: {}", e);
                TorrcSnapshot::default()
            }
        }
    }

    /// Current directive values, surfacing `NotFound` / `Io` errors.
    pub fn try_read(&mut self) -> Result<TorrcSnapshot> {
        if let Some(ref snapshot) = self.cache {
            return Ok(snapshot.clone());
        }

        let snapshot = self.load()?.snapshot();
        debug!(
            "Parsed torrc: SocksPort={:?} ExitNodes={:?}",
            snapshot.socks_port, snapshot.exit_nodes
        );
        self.cache = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Set the given directives, leaving the others untouched.
    ///
    /// Returns `Ok(false)` without touching the disk when the rewritten file
    /// would be byte-identical. The file must already exist.
    pub fn write(&mut self, socks_port: Option<&str>, exit_nodes: Option<&str>) -> Result<bool> {
        let updates = [
            (DirectiveKey::SocksPort, socks_port),
            (DirectiveKey::ExitNodes, exit_nodes),
        ];
        for (key, value) in updates {
            if let Some(value) = value {
                validate_value(key, value)?;
            }
        }

        let original = self.read_raw()?;
        let mut doc = ConfigDocument::parse(&original);
        for (key, value) in updates {
            if let Some(value) = value {
                doc.set(key, value);
            }
        }

        let rendered = doc.render();
        if rendered == original {
            info!("No changes needed in torrc.");
            return Ok(false);
        }

        replace_file(&self.path, &rendered)?;
        self.invalidate();
        info!("torrc updated: {}", self.path.display());
        Ok(true)
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    fn load(&self) -> Result<ConfigDocument> {
        Ok(ConfigDocument::parse(&self.read_raw()?))
    }

    fn read_raw(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| TorError::io(&self.path, e))
    }
}

/// Reject values that would produce a malformed or multi-line directive.
fn validate_value(key: DirectiveKey, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TorError::InvalidInput(format!("empty {} value", key)));
    }
    if value.contains(['\n', '\r']) {
        return Err(TorError::InvalidInput(format!(
            "{} value must be a single line",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_with(content: &str) -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torrc");
        fs::write(&path, content).unwrap();
        (ConfigStore::new(path), dir)
    }

    #[test]
    fn test_write_exit_nodes_scenario() {
        let (mut store, _dir) = store_with("SocksPort 9050\nExitNodes {us}\n");

        let changed = store.write(None, Some("{de}{fr}")).unwrap();

        assert!(changed);
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "SocksPort 9050\nExitNodes {de}{fr}\n"
        );
    }

    #[test]
    fn test_write_is_idempotent() {
        let (mut store, _dir) = store_with("Log notice stderr\n");

        assert!(store.write(Some("9150"), None).unwrap());
        let before = fs::read(store.path()).unwrap();
        let mtime = fs::metadata(store.path()).unwrap().modified().unwrap();

        assert!(!store.write(Some("9150"), None).unwrap());
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(fs::metadata(store.path()).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn test_round_trip_socks_port() {
        let (mut store, _dir) = store_with("SocksPort 9050\n");
        assert_eq!(store.read().socks_port.as_deref(), Some("9050"));

        store.write(Some("9150"), None).unwrap();

        assert_eq!(store.read().socks_port.as_deref(), Some("9150"));
    }

    #[test]
    fn test_passthrough_lines_preserved() {
        let content = "# header\nDataDirectory /var/lib/tor\n\nSocksPort 9050\nLog notice file /var/log/tor/notices.log\n";
        let (mut store, _dir) = store_with(content);

        store.write(None, Some("{ca}")).unwrap();

        let expected = format!("{}ExitNodes {{ca}}\n", content);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), expected);
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let mut store = ConfigStore::new(dir.path().join("torrc"));

        assert_eq!(store.read(), TorrcSnapshot::default());
        assert!(matches!(store.try_read(), Err(TorError::NotFound(_))));
    }

    #[test]
    fn test_write_missing_file_fails_without_creating() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torrc");
        let mut store = ConfigStore::new(&path);

        let err = store.write(Some("9150"), None).unwrap_err();

        assert!(matches!(err, TorError::NotFound(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_read_is_cached_until_write() {
        let (mut store, _dir) = store_with("SocksPort 9050\n");
        assert_eq!(store.read().socks_port.as_deref(), Some("9050"));

        // External edit is not seen while the cache is warm
        fs::write(store.path(), "SocksPort 9999\n").unwrap();
        assert_eq!(store.read().socks_port.as_deref(), Some("9050"));

        store.invalidate();
        assert_eq!(store.read().socks_port.as_deref(), Some("9999"));
    }

    #[test]
    fn test_noop_write_keeps_cache() {
        let (mut store, _dir) = store_with("SocksPort 9050\n");
        store.read();
        fs::write(store.path(), "SocksPort 9050\n").unwrap();

        assert!(!store.write(Some("9050"), None).unwrap());
        assert!(store.cache.is_some());
    }

    #[test]
    fn test_write_both_directives() {
        let (mut store, _dir) = store_with("SocksPort\n");

        assert!(store.write(Some("9150"), Some("{jp}{sg}")).unwrap());

        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "SocksPort 9150\nExitNodes {jp}{sg}\n"
        );
        assert_eq!(
            store.read(),
            TorrcSnapshot {
                socks_port: Some("9150".to_string()),
                exit_nodes: Some("{jp}{sg}".to_string()),
            }
        );
    }

    #[test]
    fn test_write_rejects_multiline_value() {
        let (mut store, _dir) = store_with("SocksPort 9050\n");

        let err = store.write(Some("9150\nControlPort 9051"), None).unwrap_err();

        assert!(matches!(err, TorError::InvalidInput(_)));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "SocksPort 9050\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_into_read_only_dir_is_io_error() {
        use std::os::unix::fs::PermissionsExt;

        // root ignores directory permissions
        if crate::utils::is_root() {
            return;
        }

        let (mut store, dir) = store_with("SocksPort 9050\n");
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();

        let result = store.write(Some("9150"), None);

        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(result, Err(TorError::Io { .. })));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "SocksPort 9050\n");
        assert_eq!(store.read().socks_port.as_deref(), Some("9050"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
