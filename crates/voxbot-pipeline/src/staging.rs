//! Staging area for transient synthesis artifacts.
//!
//! All concurrent requests share one staging root, but each request claims
//! its own subdirectory named `{requester-id}_{unix-timestamp}` (with a
//! numeric suffix when two claims from the same requester land in the same
//! second). The claim owns the subdirectory: dropping it removes the
//! directory and everything inside, so cleanup is scoped to the resolving
//! request and concurrent requests cannot delete each other's artifacts.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use voxbot_types::RequesterId;

/// Upper bound on same-second collision retries for one requester.
const MAX_CLAIM_ATTEMPTS: u32 = 64;

/// The shared staging root directory.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Claims a fresh per-request subdirectory.
    ///
    /// The directory name doubles as the artifact file stem, keeping the
    /// `{requester-id}_{unix-timestamp}` naming visible in the filesystem.
    pub fn claim(&self, requester: RequesterId) -> io::Result<StagingClaim> {
        std::fs::create_dir_all(&self.root)?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let base = format!("{requester}_{stamp}");

        for attempt in 0..MAX_CLAIM_ATTEMPTS {
            let stem = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}_{attempt}")
            };
            let dir = self.root.join(&stem);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok(StagingClaim { dir, stem }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("could not claim a unique staging directory for {base}"),
        ))
    }
}

/// Exclusive use of one staging subdirectory for the duration of a request.
///
/// Dropping the claim clears the subdirectory. Cleanup is best-effort and
/// never panics; a failed removal is logged and otherwise ignored.
///
/// Removal runs synchronously on the dropping thread. A claim only ever
/// holds the raw and transcoded artifacts of one request, so the blocking
/// window is a couple of file unlinks.
#[derive(Debug)]
pub struct StagingClaim {
    dir: PathBuf,
    stem: String,
}

impl StagingClaim {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination path for the raw synthesis output.
    pub fn raw_path(&self) -> PathBuf {
        self.dir.join(format!("{}.wav", self.stem))
    }
}

impl Drop for StagingClaim {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(dir = %self.dir.display(), "staging cleanup failed: {}", e);
            }
        }
    }
}
