//! Session file writer

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::{Result, TapedeckError};

use super::format::{is_session_file, SessionDocument, FILE_EXT, FILE_PREFIX};

/// Persist a session document into `dir`.
///
/// Creates the directory if absent. With `purge` set, removes every
/// pre-existing session file first so a fresh Record run fully supersedes
/// a stale one. Returns the path of the written file.
///
/// # Errors
///
/// Returns `Persistence` if the directory or file cannot be written
pub fn save(dir: &Path, document: &SessionDocument, purge: bool) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| TapedeckError::persistence(dir, e))?;

    if purge {
        purge_session_files(dir)?;
    }

    let path = next_file_path(dir);

    let json = serde_json::to_vec_pretty(document)
        .map_err(|e| TapedeckError::persistence(&path, e))?;
    fs::write(&path, json).map_err(|e| TapedeckError::persistence(&path, e))?;

    info!(
        "Saved session: {} entries, {} name queues -> {}",
        document.entries.len(),
        document.names.len(),
        path.display()
    );

    Ok(path)
}

/// Remove every session file already present in `dir`
fn purge_session_files(dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| TapedeckError::persistence(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| TapedeckError::persistence(dir, e))?;
        let path = entry.path();

        if is_session_file(&path) {
            debug!("Purging stale session file: {}", path.display());
            fs::remove_file(&path).map_err(|e| TapedeckError::persistence(&path, e))?;
        }
    }

    Ok(())
}

/// Pick a timestamp-named path that does not collide with an existing
/// file. A second save within the same second advances the stamp, so
/// lexicographic load order always follows write order.
fn next_file_path(dir: &Path) -> PathBuf {
    let mut stamp = Utc::now();

    loop {
        let name = format!("{FILE_PREFIX}{}.{FILE_EXT}", stamp.format("%Y%m%d%H%M%S"));
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        stamp += chrono::Duration::seconds(1);
    }
}
