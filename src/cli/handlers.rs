//! Workflow handlers shared by subcommands and the interactive menu.
//!
//! Handlers print what succeeded and return the failure that matters; the
//! caller prints that one line. A failed reload during rotation is printed
//! here since the restart still runs after it.

use console::style;

use tormgr::countries::{describe_exit_nodes, sorted_countries};
use tormgr::schedule::Interval;
use tormgr::service::{RotationReport, ServiceAction, ServiceOutcome};
use tormgr::{ConfigChange, Result, Summary, TorManager};

use super::icons::{dim_arrow, error, success, warn};

pub fn install(manager: &mut TorManager) -> Result<()> {
    eprintln!("Installing Tor ...");
    manager.install()?;
    eprintln!("{} Tor has been installed", success());
    Ok(())
}

pub fn update(manager: &mut TorManager) -> Result<()> {
    eprintln!("Updating Tor ...");
    manager.update()?;
    eprintln!("{} Tor has been updated", success());
    Ok(())
}

pub fn uninstall(manager: &mut TorManager) -> Result<()> {
    eprintln!("Uninstalling Tor ...");
    manager.uninstall()?;
    eprintln!("{} Tor has been uninstalled", success());
    Ok(())
}

pub async fn exit_ip(manager: &mut TorManager, port: Option<u16>) -> Result<()> {
    let ip = manager.exit_ip(port).await?;
    println!("{}", ip);
    Ok(())
}

pub fn schedule(manager: &mut TorManager, minutes: u32) -> Result<()> {
    let changed = manager.schedule(minutes)?;
    let interval = Interval::try_from(minutes)?;
    if changed {
        eprintln!(
            "{} Identity rotation scheduled every {} ({})",
            success(),
            interval,
            interval.cron_expression()
        );
    } else {
        eprintln!("{} Rotation already scheduled every {}", warn(), interval);
    }
    Ok(())
}

pub fn unschedule(manager: &mut TorManager) -> Result<()> {
    if manager.unschedule()? {
        eprintln!("{} Scheduled rotation removed", success());
    } else {
        eprintln!("{} No scheduled rotation found", warn());
    }
    Ok(())
}

pub fn rotate(manager: &mut TorManager) -> Result<()> {
    let report = manager.rotate_identity()?;
    print_rotation(&report);
    report.restart.map(|_| ())
}

pub fn set_port(manager: &mut TorManager, input: &str) -> Result<()> {
    let change = manager.change_port(input)?;
    print_change("SocksPort", &change, &change.value);
    restart_result(change)
}

pub fn set_countries(manager: &mut TorManager, input: &str) -> Result<()> {
    let change = manager.change_countries(input)?;
    print_change("ExitNodes", &change, &describe_exit_nodes(&change.value));
    restart_result(change)
}

pub fn service(manager: &mut TorManager, action: ServiceAction) -> Result<()> {
    match manager.service(action)? {
        ServiceOutcome::Status(text) => println!("{}", text),
        ServiceOutcome::Done => eprintln!("{} Tor {} OK", success(), action),
    }
    Ok(())
}

pub fn countries() {
    for (code, name) in sorted_countries() {
        println!("  {} - {}", style(code).bold(), name);
    }
}

pub fn show(manager: &mut TorManager) {
    print_summary(&manager.summary());
    println!("Torrc:     {}", manager.settings().torrc_path.display());
}

pub fn print_summary(summary: &Summary) {
    let status = if summary.installed {
        style("✓ Installed").green()
    } else {
        style("✗ Not installed").red()
    };
    let countries = summary
        .exit_nodes
        .as_deref()
        .map(describe_exit_nodes)
        .unwrap_or_else(|| "Default".to_string());
    let schedule = summary
        .schedule
        .map(|i| format!("every {}", i))
        .unwrap_or_else(|| "off".to_string());

    println!("Status:    {} ({})", status, summary.state);
    println!("Server:    127.0.0.1:{}", summary.socks_port);
    println!("Countries: {}", countries);
    println!("Rotation:  {}", schedule);
}

fn print_change(directive: &str, change: &ConfigChange, shown: &str) {
    if !change.changed {
        eprintln!("{} {} already set to {}", warn(), directive, shown);
        return;
    }
    eprintln!("{} {} set to {}", success(), directive, shown);
    if let Some(Ok(_)) = change.restart {
        eprintln!("  {} Tor restarted", dim_arrow());
    }
}

fn print_rotation(report: &RotationReport) {
    match report.reload {
        Ok(_) => eprintln!("{} Tor reloaded", success()),
        Err(ref e) => eprintln!("{} Reload failed: {}", error(), e),
    }
    if report.restart.is_ok() {
        eprintln!("{} Tor restarted, new circuits requested", success());
    }
}

/// The config write already landed; surface only a failed restart.
fn restart_result(change: ConfigChange) -> Result<()> {
    match change.restart {
        Some(Err(e)) => Err(e),
        _ => Ok(()),
    }
}
