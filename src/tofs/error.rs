//! TOFS error kinds (spec §4.1 "Failure semantics", §7).

use std::fmt;

#[derive(Debug)]
pub enum ShadowFsError {
    /// A disk file changed during a transaction, detected by snapshot
    /// mismatch. The caller must abort the transaction.
    ExternalDrift { path: String },

    /// A write targeted a path the circuit breaker classified as
    /// generated (comment markers, known extensions, build/dist dirs).
    GeneratedFile { path: String },

    /// A path attempted to escape the workspace jail through symlink
    /// resolution.
    Security { path: String, detail: String },

    /// The materialization phase ran out of disk space.
    DiskFull { path: String },

    /// Symlink resolution detected a cycle.
    CyclicSymlink { path: String },

    /// IR parsing exceeded `ir_parse_timeout_seconds`.
    ParseTimeout { path: String, timeout_seconds: u64 },

    /// The requested path does not exist in the overlay+disk union.
    NotFound { path: String },

    /// An I/O error during materialization or disk reads.
    Io(std::io::Error),
}

impl fmt::Display for ShadowFsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExternalDrift { path } => write!(
                f,
                "external drift detected on {path}: the file changed on disk during an open transaction\nTo fix: abort and restart the transaction; re-snapshot before retrying."
            ),
            Self::GeneratedFile { path } => write!(
                f,
                "{path} is a generated file (matched a @generated marker, known extension, or build/dist directory)\nTo fix: edit the source file that generates {path} instead."
            ),
            Self::Security { path, detail } => write!(
                f,
                "path {path} escapes the workspace jail: {detail}\nTo fix: ensure all symlink targets resolve within the workspace root."
            ),
            Self::DiskFull { path } => write!(
                f,
                "materializing {path} failed: disk full\nTo fix: free disk space or narrow the materialization scope."
            ),
            Self::CyclicSymlink { path } => write!(
                f,
                "cyclic symlink detected while resolving {path}\nTo fix: remove the symlink cycle on disk before starting a transaction."
            ),
            Self::ParseTimeout { path, timeout_seconds } => write!(
                f,
                "parsing {path} exceeded the {timeout_seconds}s timeout\nTo fix: raise ir_parse_timeout_seconds or split the file."
            ),
            Self::NotFound { path } => write!(f, "{path} not found (tombstoned, or absent from both overlay and disk)"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ShadowFsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ShadowFsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
