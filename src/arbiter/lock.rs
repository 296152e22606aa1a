//! Advisory arbitration marker
//!
//! Cooperative signal between this hook and the independently running
//! transcription router: while the marker exists, the router withholds
//! transcriptions from the session input path so a spoken reply is not also
//! typed into the session. Not a kernel mutex; the host issues at most one
//! permission request per session at a time, so the marker has a single
//! writer by construction.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Guard for the advisory marker. Releasing is idempotent, and the marker is
/// also removed when the guard is dropped, so an interrupted or panicking
/// session cannot leave the router muted.
pub struct ArbitrationLock {
    path: PathBuf,
    held: bool,
}

impl ArbitrationLock {
    /// Create the marker unconditionally.
    ///
    /// Concurrent holders are not detected or rejected; the surrounding
    /// system guarantees single-flight.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, format!("{}\n", std::process::id()))?;
        debug!(path = %path.display(), "arbitration marker created");

        Ok(Self {
            path: path.to_owned(),
            held: true,
        })
    }

    /// Remove the marker. Calling this when the marker is already gone is a
    /// no-op, never an error.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;

        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "arbitration marker removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(?e, "failed to remove arbitration marker"),
        }
    }

    /// Whether this guard still holds the marker
    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for ArbitrationLock {
    fn drop(&mut self) {
        self.release();
    }
}
