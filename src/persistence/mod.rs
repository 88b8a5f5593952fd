//! Save/restore of live sessions
//!
//! Features:
//! - Plain JSON snapshot of every session (dogs, bags, loose loot)
//! - Atomic replace (write a temp file beside the target, then persist over it)
//! - Id counters restored above every saved id

pub mod snapshot;

pub use snapshot::{DogSnapshot, GameSnapshot, SessionSnapshot};

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::PersistenceError;

/// Write `snapshot` to `path`, replacing any previous file atomically.
/// A failed save leaves the previous file and no temp file behind.
pub fn save(path: &Path, snapshot: &GameSnapshot) -> Result<(), PersistenceError> {
    let io_err = |source: io::Error| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let bytes = serde_json::to_vec_pretty(snapshot)?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(io_err)?;
    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(&bytes).map_err(io_err)?;
    file.persist(path).map_err(|err| io_err(err.error))?;

    log::info!(
        "Saved {} session(s) to {}",
        snapshot.sessions.len(),
        path.display()
    );
    Ok(())
}

/// Read a snapshot written by [`save`]
pub fn load(path: &Path) -> Result<GameSnapshot, PersistenceError> {
    let text = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
