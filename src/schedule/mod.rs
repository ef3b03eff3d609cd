//! Periodic identity rotation through a cron entry.
//!
//! The entry runs a small generated script that reloads and then restarts the
//! Tor service. At most one entry references the script at any time.

mod interval;
mod table;

pub use interval::Interval;
pub use table::{Crontab, FileTable, ScheduleTable};

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::Result;
use crate::utils::replace_file_with_mode;

/// Installs, replaces and removes the rotation entry.
pub struct ScheduleManager {
    script_path: PathBuf,
    service_name: String,
    table: Box<dyn ScheduleTable>,
}

impl ScheduleManager {
    pub fn new(
        script_path: impl Into<PathBuf>,
        service_name: impl Into<String>,
        table: Box<dyn ScheduleTable>,
    ) -> Self {
        Self {
            script_path: script_path.into(),
            service_name: service_name.into(),
            table,
        }
    }

    /// Body of the restart script.
    pub fn restart_script(&self) -> String {
        format!(
            "#!/bin/sh\nsystemctl reload {svc}\nsystemctl restart {svc} || service {svc} restart\n",
            svc = self.service_name
        )
    }

    /// The table line for `interval`, with a user column for system tables.
    pub fn entry(&self, interval: Interval) -> String {
        match self.table.user_field() {
            Some(user) => format!(
                "{} {} {}",
                interval.cron_expression(),
                user,
                self.script_path.display()
            ),
            None => format!("{} {}", interval.cron_expression(), self.script_path.display()),
        }
    }

    /// Install (or replace) the rotation entry for `minutes`.
    ///
    /// Returns `Ok(false)` when the identical entry is already the only one.
    pub fn install(&self, minutes: u32) -> Result<bool> {
        let interval = Interval::try_from(minutes)?;

        let current = self.table.load()?;
        let mut lines = self.other_lines(&current);
        lines.push(self.entry(interval));
        let updated = render(&lines);

        let script_existed = self.script_path.exists();
        replace_file_with_mode(&self.script_path, &self.restart_script(), 0o755)?;

        if updated == current {
            info!("Cron job already installed: every {}", interval);
            return Ok(false);
        }

        if let Err(e) = self.table.store(&updated) {
            if !script_existed {
                if let Err(rm) = fs::remove_file(&self.script_path) {
                    warn!(
                        "Could not remove {}: {}",
                        self.script_path.display(),
                        rm
                    );
                }
            }
            return Err(e);
        }
        info!(
            "Cron job installed: every {} (expr: {})",
            interval,
            interval.cron_expression()
        );
        Ok(true)
    }

    /// Drop the rotation entry. Returns whether one was present.
    pub fn remove(&self) -> Result<bool> {
        let current = self.table.load()?;
        if self.entries(&current).next().is_none() {
            return Ok(false);
        }

        let lines = self.other_lines(&current);
        self.table.store(&render(&lines))?;
        info!("Cron job removed for {}", self.script_path.display());
        Ok(true)
    }

    /// Interval of the installed entry, if any.
    pub fn current(&self) -> Result<Option<Interval>> {
        let current = self.table.load()?;
        let interval = self.entries(&current).find_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 6 {
                return None;
            }
            Interval::from_cron_expression(&fields[..5].join(" "))
        });
        Ok(interval)
    }

    fn references_script(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            return false;
        }
        let script = self.script_path.to_string_lossy();
        trimmed.split_whitespace().any(|token| token == script)
    }

    fn entries<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        table.lines().filter(move |line| self.references_script(line))
    }

    fn other_lines(&self, table: &str) -> Vec<String> {
        table
            .lines()
            .filter(|line| !line.trim().is_empty() && !self.references_script(line))
            .map(str::to_string)
            .collect()
    }
}

fn render(lines: &[String]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}
