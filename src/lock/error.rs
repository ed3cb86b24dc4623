//! Soft-lock error kinds (spec §7, §4.2).

use std::fmt;

#[derive(Debug)]
pub enum LockError {
    /// The path is already held by a different agent and the requester did
    /// not pass `force`.
    LockConflict { path: String, held_by: String },

    /// The caller addressed a lock that does not exist or already expired.
    LockExpired { path: String },

    /// `detect_drift` found the live content hash diverged from the hash
    /// recorded at acquisition time.
    DriftDetected { path: String },
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LockConflict { path, held_by } => write!(
                f,
                "{path} is already locked by {held_by}\nTo fix: wait for the lock to expire, ask {held_by} to release it, or pass force=true to override."
            ),
            Self::LockExpired { path } => write!(
                f,
                "no active lock on {path} (expired or never acquired)\nTo fix: acquire the lock again before mutating {path}."
            ),
            Self::DriftDetected { path } => write!(
                f,
                "{path} changed on disk since the lock was acquired\nTo fix: release the lock, re-read {path}, and re-acquire before retrying."
            ),
        }
    }
}

impl std::error::Error for LockError {}
