//! Filesystem helpers with operation + path error context.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Ensure a directory exists, creating it (recursively) if needed.
pub fn ensure_dir_all_with_op(op: &'static str, path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::io_path(op, path, e))
}

/// Ensure the parent directory of a file path exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    ensure_dir_all_with_op("creating directory", parent)
}

/// Replace `path` with `contents` so that readers see either the old file or
/// the complete new one.
///
/// The data goes to a temporary file in the same directory, is synced, and
/// is then renamed over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|e| Error::io_path("creating temp file in", dir, e))?;
    tmp.write_all(contents)
        .map_err(|e| Error::io_path("writing temp file for", path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::io_path("syncing temp file for", path, e))?;
    tmp.persist(path)
        .map_err(|e| Error::io_path("replacing", path, e.error))?;
    Ok(())
}

/// Remove a file, treating a missing file as already removed.
///
/// Returns whether a file was actually deleted.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io_path("removing", path, e)),
    }
}
