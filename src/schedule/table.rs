//! Backends holding the schedule (cron) table.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, TorError};
use crate::exec;
use crate::utils::{replace_file, replace_file_with_mode};

/// Whole-table read and atomic whole-table replace.
pub trait ScheduleTable {
    /// Current table contents; a table that does not exist yet is empty.
    fn load(&self) -> Result<String>;

    /// Replace the entire table with `contents`.
    fn store(&self, contents: &str) -> Result<()>;

    /// User column required by system tables (`/etc/crontab`, `/etc/cron.d`).
    fn user_field(&self) -> Option<&str> {
        None
    }
}

/// The invoking user's crontab, managed through the `crontab` command.
#[derive(Debug, Clone, Default)]
pub struct Crontab;

impl ScheduleTable for Crontab {
    fn load(&self) -> Result<String> {
        let output = exec::run(Command::new("crontab").arg("-l"))?;
        if output.success {
            return Ok(output.stdout);
        }
        // "no crontab for <user>" exits non-zero but just means empty
        if output.stderr.to_lowercase().contains("no crontab") {
            debug!("No existing crontab");
            return Ok(String::new());
        }
        Err(TorError::CommandFailed(format!(
            "crontab -l: {}",
            output.diagnostic()
        )))
    }

    fn store(&self, contents: &str) -> Result<()> {
        let mut tmp = NamedTempFile::new().map_err(|e| TorError::io(std::env::temp_dir(), e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| TorError::io(tmp.path(), e))?;
        tmp.flush().map_err(|e| TorError::io(tmp.path(), e))?;

        // crontab swaps the spool file in one step; the temp file is removed on drop
        exec::run(Command::new("crontab").arg(tmp.path()))?.into_result("crontab")?;
        Ok(())
    }
}

/// A cron table kept in a plain file.
///
/// [`FileTable::new`] holds user-crontab lines (five time fields, then the
/// command). [`FileTable::system`] holds `/etc/cron.d` lines, which carry the
/// user to run as between the time fields and the command.
#[derive(Debug, Clone)]
pub struct FileTable {
    path: PathBuf,
    user: Option<String>,
}

impl FileTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            user: None,
        }
    }

    pub fn system(path: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            user: Some(user.into()),
        }
    }
}

impl ScheduleTable for FileTable {
    fn load(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(TorError::io(&self.path, e)),
        }
    }

    fn store(&self, contents: &str) -> Result<()> {
        debug!("Writing schedule table {}", self.path.display());
        if self.path.exists() {
            replace_file(&self.path, contents)
        } else {
            replace_file_with_mode(&self.path, contents, 0o644)
        }
    }

    fn user_field(&self) -> Option<&str> {
        self.user.as_deref()
    }
}
