//! Atomic file replacement.
//!
//! Content is written to a temporary file in the target's directory and then
//! renamed over the target, so readers see either the old or the new bytes.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, TorError};

/// Replace `path` with `contents`, keeping the existing file's permissions.
pub fn replace_file(path: &Path, contents: &str) -> Result<()> {
    let permissions = fs::metadata(path).ok().map(|m| m.permissions());
    write_and_persist(path, contents, permissions)
}

/// Replace `path` with `contents` and set an explicit unix mode.
pub fn replace_file_with_mode(path: &Path, contents: &str, mode: u32) -> Result<()> {
    #[cfg(unix)]
    let permissions = {
        use std::os::unix::fs::PermissionsExt;
        Some(fs::Permissions::from_mode(mode))
    };
    #[cfg(not(unix))]
    let permissions = {
        let _ = mode;
        None
    };
    write_and_persist(path, contents, permissions)
}

fn write_and_persist(
    path: &Path,
    contents: &str,
    permissions: Option<fs::Permissions>,
) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| TorError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| TorError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| TorError::io(tmp.path(), e))?;

    if let Some(permissions) = permissions {
        fs::set_permissions(tmp.path(), permissions).map_err(|e| TorError::io(tmp.path(), e))?;
    }

    // On failure the temp file is dropped (and removed); the target is untouched.
    tmp.persist(path).map_err(|e| TorError::io(path, e.error))?;
    Ok(())
}
