//! Session file reader

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{Result, TapedeckError};

use super::format::{is_session_file, SessionDocument, FORMAT_VERSION};

/// Load every session file in `dir` into one merged document.
///
/// Files are read in lexicographic filename order so replay ordering is
/// deterministic across machines; an absent directory is an empty
/// session. An unreadable or malformed file is a hard error rather than
/// a skip: a partial session silently changes which entries replay and
/// can mask test bugs.
///
/// # Errors
///
/// Returns `Persistence` on an unreadable directory, unreadable or
/// malformed file, or unsupported format version
pub fn load(dir: &Path) -> Result<SessionDocument> {
    if !dir.exists() {
        debug!("Session directory absent, starting empty: {}", dir.display());
        return Ok(SessionDocument::new());
    }

    let mut files = session_files(dir)?;
    files.sort();

    let mut merged = SessionDocument::new();
    for path in files {
        merged.merge(read_file(&path)?);
    }

    info!(
        "Loaded session from {}: {} entries, {} name queues",
        dir.display(),
        merged.entries.len(),
        merged.names.len()
    );

    Ok(merged)
}

/// Collect session file paths in `dir`
fn session_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| TapedeckError::persistence(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TapedeckError::persistence(dir, e))?;
        let path = entry.path();

        if is_session_file(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

/// Read and validate one session file
fn read_file(path: &Path) -> Result<SessionDocument> {
    let data = fs::read(path).map_err(|e| TapedeckError::persistence(path, e))?;

    let document: SessionDocument =
        serde_json::from_slice(&data).map_err(|e| TapedeckError::persistence(path, e))?;

    if document.version != FORMAT_VERSION {
        return Err(TapedeckError::persistence(
            path,
            format!(
                "unsupported format version {}, expected {FORMAT_VERSION}",
                document.version
            ),
        ));
    }

    debug!(
        "Read session file {}: {} entries",
        path.display(),
        document.entries.len()
    );

    Ok(document)
}
