//! End-to-end workflow tests.
//!
//! Drives `TorManager` against a temp torrc, a fake `tor` binary on a private
//! search path, and recording fakes for systemd, cron and apt.

#![cfg(unix)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::{tempdir, TempDir};

use tormgr::exec::CommandOutput;
use tormgr::packages::PackageManager;
use tormgr::presence::PresenceGate;
use tormgr::schedule::{FileTable, Interval};
use tormgr::service::{ServiceAction, ServiceManager, ServiceOutcome, ServiceState};
use tormgr::{Result, Settings, TorError, TorManager};

type Log = Rc<RefCell<Vec<String>>>;

struct FakeService {
    log: Log,
    failing: HashSet<ServiceAction>,
}

impl ServiceManager for FakeService {
    fn run(&self, action: ServiceAction, service: &str) -> Result<CommandOutput> {
        self.log
            .borrow_mut()
            .push(format!("systemctl {} {}", action, service));
        if self.failing.contains(&action) {
            Ok(CommandOutput::failed(format!(
                "Job for {}.service failed.",
                service
            )))
        } else if action == ServiceAction::Status {
            Ok(CommandOutput::ok("active (running)"))
        } else {
            Ok(CommandOutput::ok(""))
        }
    }

    fn active_state(&self, _service: &str) -> Result<CommandOutput> {
        Ok(CommandOutput::ok("active\n"))
    }
}

/// Records calls; installing `tor` drops a fake binary into `bin`.
struct FakePackages {
    log: Log,
    bin: PathBuf,
}

impl PackageManager for FakePackages {
    fn update(&self) -> Result<CommandOutput> {
        self.log.borrow_mut().push("apt update".to_string());
        Ok(CommandOutput::ok(""))
    }

    fn install(&self, packages: &[&str]) -> Result<CommandOutput> {
        self.log
            .borrow_mut()
            .push(format!("apt install {}", packages.join(" ")));
        if packages.contains(&"tor") {
            write_executable(&self.bin.join("tor"));
        }
        Ok(CommandOutput::ok(""))
    }

    fn remove(&self, package: &str) -> Result<CommandOutput> {
        self.log.borrow_mut().push(format!("apt remove {}", package));
        let _ = fs::remove_file(self.bin.join(package));
        Ok(CommandOutput::ok(""))
    }

    fn upgrade(&self, package: &str) -> Result<CommandOutput> {
        self.log.borrow_mut().push(format!("apt upgrade {}", package));
        Ok(CommandOutput::ok(""))
    }
}

fn write_executable(path: &Path) {
    fs::write(path, "#!/bin/sh\n").unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

struct Fixture {
    dir: TempDir,
    log: Log,
}

impl Fixture {
    fn new(installed: bool, torrc: Option<&str>) -> Self {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();
        if installed {
            write_executable(&dir.path().join("bin").join("tor"));
        }
        if let Some(contents) = torrc {
            fs::write(dir.path().join("torrc"), contents).unwrap();
        }
        Self {
            dir,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn manager(&self) -> TorManager {
        self.manager_failing(&[])
    }

    fn manager_failing(&self, failing: &[ServiceAction]) -> TorManager {
        let settings = Settings {
            torrc_path: self.path("torrc"),
            script_path: self.path("restart_tor.sh"),
            ..Settings::default()
        };
        TorManager::new(
            settings,
            PresenceGate::with_search_path("tor", self.path("bin")),
            Box::new(FakeService {
                log: self.log.clone(),
                failing: failing.iter().copied().collect(),
            }),
            Box::new(FileTable::new(self.path("crontab"))),
            Box::new(FakePackages {
                log: self.log.clone(),
                bin: self.path("bin"),
            }),
        )
    }

    fn torrc(&self) -> String {
        fs::read_to_string(self.path("torrc")).unwrap()
    }

    fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

#[tokio::test]
async fn test_not_installed_blocks_every_mutation() {
    let fx = Fixture::new(false, Some("SocksPort 9050\n"));
    let mut manager = fx.manager();

    assert!(matches!(
        manager.change_countries("de"),
        Err(TorError::NotInstalled)
    ));
    assert!(matches!(
        manager.rotate_identity(),
        Err(TorError::NotInstalled)
    ));
    assert!(matches!(
        manager.service(ServiceAction::Start),
        Err(TorError::NotInstalled)
    ));
    assert!(matches!(manager.schedule(30), Err(TorError::NotInstalled)));
    assert!(matches!(manager.update(), Err(TorError::NotInstalled)));
    assert!(matches!(manager.uninstall(), Err(TorError::NotInstalled)));
    assert!(matches!(
        manager.exit_ip(None).await,
        Err(TorError::NotInstalled)
    ));

    assert!(fx.calls().is_empty());
    assert_eq!(fx.torrc(), "SocksPort 9050\n");
    assert!(!fx.path("crontab").exists());
    assert!(!fx.path("restart_tor.sh").exists());
}

#[test]
fn test_change_countries_writes_then_restarts() {
    let fx = Fixture::new(true, Some("SocksPort 9050\nExitNodes {us}\n"));
    let mut manager = fx.manager();

    let change = manager.change_countries("de, FR").unwrap();

    assert!(change.changed);
    assert_eq!(change.value, "{de}{fr}");
    assert!(matches!(change.restart, Some(Ok(ServiceOutcome::Done))));
    assert_eq!(fx.torrc(), "SocksPort 9050\nExitNodes {de}{fr}\n");
    assert_eq!(fx.calls(), vec!["systemctl restart tor"]);
}

#[test]
fn test_unchanged_write_skips_restart() {
    let fx = Fixture::new(true, Some("SocksPort 9050\nExitNodes {de}\n"));
    let mut manager = fx.manager();

    let change = manager.change_countries("de").unwrap();

    assert!(!change.changed);
    assert!(change.restart.is_none());
    assert!(fx.calls().is_empty());
}

#[test]
fn test_failed_restart_keeps_written_config() {
    let fx = Fixture::new(true, Some("SocksPort 9050\n"));
    let mut manager = fx.manager_failing(&[ServiceAction::Restart]);

    let change = manager.change_countries("es").unwrap();

    assert!(change.changed);
    match change.restart {
        Some(Err(TorError::CommandFailed(msg))) => assert!(msg.contains("failed")),
        other => panic!("expected failed restart, got {:?}", other),
    }
    assert_eq!(fx.torrc(), "SocksPort 9050\nExitNodes {es}\n");
}

#[test]
fn test_missing_torrc_is_not_created() {
    let fx = Fixture::new(true, None);
    let mut manager = fx.manager();

    assert!(matches!(
        manager.change_countries("de"),
        Err(TorError::NotFound(_))
    ));
    assert!(!fx.path("torrc").exists());
    assert!(fx.calls().is_empty());

    // Reads fall back to defaults instead of failing.
    assert_eq!(manager.socks_port(), 9050);
    assert_eq!(manager.torrc().exit_nodes, None);
}

#[test]
fn test_change_port_rejects_port_in_use() {
    let fx = Fixture::new(true, Some("SocksPort 9050\n"));
    let mut manager = fx.manager();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let busy = listener.local_addr().unwrap().port();

    let err = manager.change_port(&busy.to_string()).unwrap_err();

    assert!(matches!(err, TorError::InvalidInput(_)));
    assert_eq!(fx.torrc(), "SocksPort 9050\n");
    assert!(fx.calls().is_empty());
}

#[test]
fn test_change_port_rejects_malformed_input_before_gate() {
    let fx = Fixture::new(false, Some("SocksPort 9050\n"));
    let mut manager = fx.manager();

    for input in ["", "abc", "0", "70000"] {
        assert!(matches!(
            manager.change_port(input),
            Err(TorError::InvalidInput(_))
        ));
    }
}

#[test]
fn test_change_port_to_free_port() {
    let fx = Fixture::new(true, Some("# local client\nSocksPort 9050\n"));
    let mut manager = fx.manager();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let change = manager.change_port(&port.to_string()).unwrap();

    assert!(change.changed);
    assert_eq!(fx.torrc(), format!("# local client\nSocksPort {}\n", port));
    assert_eq!(manager.socks_port(), port);
}

#[test]
fn test_rotate_reloads_then_restarts() {
    let fx = Fixture::new(true, Some(""));
    let mut manager = fx.manager_failing(&[ServiceAction::Reload]);

    let report = manager.rotate_identity().unwrap();

    assert!(report.reload.is_err());
    assert!(report.restarted());
    assert_eq!(
        fx.calls(),
        vec!["systemctl reload tor", "systemctl restart tor"]
    );
}

#[test]
fn test_install_invalidates_presence() {
    let fx = Fixture::new(false, None);
    let mut manager = fx.manager();

    assert!(!manager.is_installed());
    manager.install().unwrap();
    assert!(manager.is_installed());

    assert_eq!(
        fx.calls(),
        vec!["apt update", "apt install tor", "apt install tor-geoipdb"]
    );

    manager.uninstall().unwrap();
    assert!(!manager.is_installed());
}

#[test]
fn test_schedule_replaces_previous_entry() {
    let fx = Fixture::new(true, Some(""));
    fs::write(fx.path("crontab"), "15 3 * * * /usr/local/bin/backup\n").unwrap();
    let mut manager = fx.manager();

    assert!(manager.schedule(30).unwrap());
    assert!(manager.schedule(60).unwrap());
    assert!(!manager.schedule(60).unwrap());

    let script = fx.path("restart_tor.sh");
    let table = fs::read_to_string(fx.path("crontab")).unwrap();
    assert_eq!(
        table,
        format!(
            "15 3 * * * /usr/local/bin/backup\n0 * * * * {}\n",
            script.display()
        )
    );
    assert_eq!(manager.scheduled_interval().unwrap(), Some(Interval::Hourly));

    let mode = fs::metadata(&script).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);

    assert!(manager.unschedule().unwrap());
    assert_eq!(manager.scheduled_interval().unwrap(), None);
}

#[test]
fn test_unsupported_interval_has_no_side_effects() {
    let fx = Fixture::new(true, Some(""));
    let mut manager = fx.manager();

    assert!(matches!(
        manager.schedule(45),
        Err(TorError::UnsupportedInterval(45))
    ));
    assert!(!fx.path("crontab").exists());
    assert!(!fx.path("restart_tor.sh").exists());
}

#[test]
fn test_summary_reflects_disk_state() {
    let fx = Fixture::new(true, Some("SocksPort 127.0.0.1:9150\nExitNodes {de}{fr}\n"));
    let mut manager = fx.manager();

    let summary = manager.summary();

    assert!(summary.installed);
    assert_eq!(summary.state, ServiceState::Running);
    assert_eq!(summary.socks_port, 9150);
    assert_eq!(summary.exit_nodes.as_deref(), Some("{de}{fr}"));
    assert_eq!(summary.schedule, None);
}
