//! Workflows tying the torrc, presence gate, service, schedule and package
//! layers together.
//!
//! Every mutating workflow checks the presence gate first. Config writes come
//! before the restart that applies them; a failed restart is reported in the
//! result but does not undo the write.

use tracing::{info, warn};

use crate::config::{Settings, DEFAULT_SOCKS_PORT};
use crate::countries::{exit_nodes_value, parse_country_codes};
use crate::error::{Result, TorError};
use crate::exit_ip::fetch_exit_ip;
use crate::packages::{Apt, PackageManager};
use crate::presence::PresenceGate;
use crate::probe::{is_port_free, validate_port};
use crate::schedule::{Crontab, FileTable, Interval, ScheduleManager, ScheduleTable};
use crate::service::{
    RotationReport, ServiceAction, ServiceController, ServiceManager, ServiceOutcome,
    ServiceState, Systemctl,
};
use crate::torrc::{ConfigStore, TorrcSnapshot};

/// Result of a config-changing workflow.
#[derive(Debug)]
pub struct ConfigChange {
    /// Value written to the torrc.
    pub value: String,
    /// Whether the file changed on disk.
    pub changed: bool,
    /// Restart outcome; `None` when nothing changed and no restart was needed.
    pub restart: Option<Result<ServiceOutcome>>,
}

/// Point-in-time view for the menu header and `show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub installed: bool,
    pub state: ServiceState,
    pub socks_port: u16,
    pub exit_nodes: Option<String>,
    pub schedule: Option<Interval>,
}

pub struct TorManager {
    settings: Settings,
    store: ConfigStore,
    gate: PresenceGate,
    service: ServiceController,
    schedule: ScheduleManager,
    packages: Box<dyn PackageManager>,
}

impl TorManager {
    /// Wire a manager with explicit capabilities.
    pub fn new(
        settings: Settings,
        gate: PresenceGate,
        service_manager: Box<dyn ServiceManager>,
        schedule_table: Box<dyn ScheduleTable>,
        packages: Box<dyn PackageManager>,
    ) -> Self {
        let store = ConfigStore::new(settings.torrc_path.clone());
        let service = ServiceController::new(settings.service_name.clone(), service_manager);
        let schedule = ScheduleManager::new(
            settings.script_path.clone(),
            settings.service_name.clone(),
            schedule_table,
        );
        Self {
            settings,
            store,
            gate,
            service,
            schedule,
            packages,
        }
    }

    /// Production wiring: PATH lookup, systemctl, cron, apt.
    pub fn system(settings: Settings) -> Self {
        let gate = PresenceGate::new(settings.binary_name.clone());
        let table = schedule_table(&settings);
        Self::new(settings, gate, Box::new(Systemctl), table, Box::new(Apt))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_installed(&mut self) -> bool {
        self.gate.is_present(true)
    }

    pub fn torrc(&mut self) -> TorrcSnapshot {
        self.store.read()
    }

    /// SOCKS port from the torrc, or Tor's default when unset or unparsable.
    pub fn socks_port(&mut self) -> u16 {
        self.store
            .read()
            .socks_port
            .as_deref()
            .and_then(parse_socks_port)
            .unwrap_or(DEFAULT_SOCKS_PORT)
    }

    pub fn summary(&mut self) -> Summary {
        let installed = self.is_installed();
        let state = self.service.state(&mut self.gate);
        let socks_port = self.socks_port();
        let exit_nodes = self.store.read().exit_nodes;
        let schedule = match self.schedule.current() {
            Ok(interval) => interval,
            Err(e) => {
                warn!("Could not read schedule: {}", e);
                None
            }
        };
        Summary {
            installed,
            state,
            socks_port,
            exit_nodes,
            schedule,
        }
    }

    /// Refresh the package index and install the configured packages in order.
    pub fn install(&mut self) -> Result<()> {
        info!("Installing Tor and dependencies...");
        let result = self.run_install();
        self.gate.invalidate();
        self.store.invalidate();
        if result.is_ok() {
            info!("Tor installation completed.");
        }
        result
    }

    fn run_install(&self) -> Result<()> {
        self.packages.update()?.into_result("update packages")?;
        for package in &self.settings.packages {
            self.packages
                .install(&[package.as_str()])?
                .into_result(&format!("install {}", package))?;
            info!("Installed {}", package);
        }
        Ok(())
    }

    pub fn uninstall(&mut self) -> Result<()> {
        self.gate.require()?;
        let package = self.settings.primary_package().to_string();
        let result = self
            .packages
            .remove(&package)
            .and_then(|out| out.into_result(&format!("remove {}", package)));
        self.gate.invalidate();
        self.store.invalidate();
        result.map(|_| info!("Tor uninstalled."))
    }

    pub fn update(&mut self) -> Result<()> {
        self.gate.require()?;
        let package = self.settings.primary_package().to_string();
        self.packages.update()?.into_result("update packages")?;
        self.packages
            .upgrade(&package)?
            .into_result(&format!("upgrade {}", package))?;
        info!("Tor updated.");
        Ok(())
    }

    /// Validate, probe and write a new `SocksPort`, restarting on change.
    pub fn change_port(&mut self, input: &str) -> Result<ConfigChange> {
        let port = validate_port(input)?;
        self.gate.require()?;

        let value = port.to_string();
        let current = self.store.read().socks_port;
        if current.as_deref() != Some(value.as_str())
            && !is_port_free(&value, self.settings.probe_timeout())
        {
            return Err(TorError::InvalidInput(format!("port {} is in use", port)));
        }

        self.apply_config(Some(value), None)
    }

    /// Validate country codes and write `ExitNodes`, restarting on change.
    pub fn change_countries(&mut self, input: &str) -> Result<ConfigChange> {
        let codes = parse_country_codes(input)?;
        self.gate.require()?;
        self.apply_config(None, Some(exit_nodes_value(&codes)))
    }

    fn apply_config(
        &mut self,
        socks_port: Option<String>,
        exit_nodes: Option<String>,
    ) -> Result<ConfigChange> {
        let changed = self
            .store
            .write(socks_port.as_deref(), exit_nodes.as_deref())?;
        let value = socks_port.or(exit_nodes).unwrap_or_default();

        let restart = if changed {
            Some(self.service.apply(&mut self.gate, ServiceAction::Restart))
        } else {
            None
        };

        Ok(ConfigChange {
            value,
            changed,
            restart,
        })
    }

    /// New circuits: reload then restart, both attempted.
    pub fn rotate_identity(&mut self) -> Result<RotationReport> {
        self.service.rotate(&mut self.gate)
    }

    pub fn service(&mut self, action: ServiceAction) -> Result<ServiceOutcome> {
        self.service.apply(&mut self.gate, action)
    }

    /// Externally visible address through the local SOCKS port.
    pub async fn exit_ip(&mut self, port: Option<u16>) -> Result<String> {
        self.gate.require()?;
        let port = match port {
            Some(port) => port,
            None => self.socks_port(),
        };
        fetch_exit_ip(
            port,
            &self.settings.ip_check_url,
            self.settings.http_timeout(),
        )
        .await
    }

    pub fn schedule(&mut self, minutes: u32) -> Result<bool> {
        let interval = Interval::try_from(minutes)?;
        self.gate.require()?;
        self.schedule.install(interval.minutes())
    }

    pub fn unschedule(&mut self) -> Result<bool> {
        self.schedule.remove()
    }

    pub fn scheduled_interval(&self) -> Result<Option<Interval>> {
        self.schedule.current()
    }
}

/// The configured system cron file, or the invoking user's crontab.
fn schedule_table(settings: &Settings) -> Box<dyn ScheduleTable> {
    match settings.schedule_table {
        Some(ref path) => Box::new(FileTable::system(path.clone(), settings.schedule_user.as_str())),
        None => Box::new(Crontab),
    }
}

/// Port part of a `SocksPort` value such as `9050` or `127.0.0.1:9150`.
fn parse_socks_port(value: &str) -> Option<u16> {
    let port = value.rsplit(':').next()?;
    port.parse().ok().filter(|p| *p != 0)
}
