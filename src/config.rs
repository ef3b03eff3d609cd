//! Tool settings: where the torrc lives, which service to drive, and so on.
//!
//! Resolution order is built-in defaults, then an optional TOML file, then
//! `TORMGR_*` environment variables. CLI flags are applied by the caller.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TorError};

/// Default torrc location on Debian-family systems.
pub const DEFAULT_TORRC_PATH: &str = "/etc/tor/torrc";

/// Default location of the generated restart script.
pub const DEFAULT_SCRIPT_PATH: &str = "/usr/bin/restart_tor.sh";

/// Port Tor listens on when the torrc does not set `SocksPort`.
pub const DEFAULT_SOCKS_PORT: u16 = 9050;

/// Settings for a tormgr invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the torrc file that is read and rewritten.
    pub torrc_path: PathBuf,

    /// Path of the restart script referenced by the schedule entry.
    pub script_path: PathBuf,

    /// Name of the system service (`systemctl <action> <service>`).
    pub service_name: String,

    /// Binary looked up on PATH to decide whether Tor is installed.
    pub binary_name: String,

    /// Packages installed by `install` in order.
    pub packages: Vec<String>,

    /// Plain-text endpoint that echoes the caller's address.
    pub ip_check_url: String,

    /// Timeout for the local port probe, in milliseconds.
    pub probe_timeout_ms: u64,

    /// Timeout for the exit IP request, in seconds.
    pub http_timeout_secs: u64,

    /// System cron table (e.g. `/etc/cron.d/tormgr`) to hold the rotation
    /// entry. `None` uses the invoking user's crontab.
    pub schedule_table: Option<PathBuf>,

    /// User column written to entries in `schedule_table`.
    pub schedule_user: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            torrc_path: PathBuf::from(DEFAULT_TORRC_PATH),
            script_path: PathBuf::from(DEFAULT_SCRIPT_PATH),
            service_name: "tor".to_string(),
            binary_name: "tor".to_string(),
            packages: vec!["tor".to_string(), "tor-geoipdb".to_string()],
            ip_check_url: "http://checkip.amazonaws.com".to_string(),
            probe_timeout_ms: 500,
            http_timeout_secs: 10,
            schedule_table: None,
            schedule_user: "root".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an explicit path or the default config location.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        Ok(settings.with_env_overrides())
    }

    /// `$XDG_CONFIG_HOME/tormgr/config.toml` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tormgr").join("config.toml"))
    }

    /// Parse a TOML settings file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| TorError::io(path, e))?;
        Self::from_toml(&content)
            .map_err(|e| TorError::Config(format!("{}: {}", path.display(), e)))
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = non_empty_var("TORMGR_TORRC") {
            self.torrc_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty_var("TORMGR_SCRIPT") {
            self.script_path = PathBuf::from(path);
        }
        if let Some(name) = non_empty_var("TORMGR_SERVICE") {
            self.service_name = name;
        }
        if let Some(name) = non_empty_var("TORMGR_BINARY") {
            self.binary_name = name;
        }
        if let Some(url) = non_empty_var("TORMGR_IP_CHECK_URL") {
            self.ip_check_url = url;
        }
        if let Some(path) = non_empty_var("TORMGR_SCHEDULE_TABLE") {
            self.schedule_table = Some(PathBuf::from(path));
        }
        self
    }

    /// Package removed by `uninstall` and upgraded by `update`.
    pub fn primary_package(&self) -> &str {
        self.packages
            .first()
            .map(String::as_str)
            .unwrap_or(&self.binary_name)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
