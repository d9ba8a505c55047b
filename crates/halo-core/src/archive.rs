//! Final rename of a normalized cutout to `{simulation}_{snapshot}_{original}`.

use crate::domain::{HaloError, HaloResult, SnapshotRef};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn archive_name(simulation: &str, snapshot: &SnapshotRef, original: &str) -> String {
    format!("{simulation}_{snapshot}_{original}")
}

/// Renames `path` within its own directory and returns the new location.
///
/// An existing file with the archive name is replaced.
pub fn archive(path: &Path, simulation: &str, snapshot: &SnapshotRef) -> HaloResult<PathBuf> {
    let original = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            HaloError::io_system(
                "IO.CUTOUT_NAME",
                format!("'{}' has no usable file name", path.display()),
            )
        })?;
    let target = path.with_file_name(archive_name(simulation, snapshot, original));
    if target.exists() {
        warn!(target = %target.display(), "replacing previously archived cutout");
    }

    fs::rename(path, &target).map_err(|source| {
        HaloError::io_system(
            "IO.CUTOUT_RENAME",
            format!(
                "failed to rename '{}' to '{}': {}",
                path.display(),
                target.display(),
                source
            ),
        )
    })?;
    debug!(from = %path.display(), to = %target.display(), "cutout archived");
    Ok(target)
}
