//! Unified error type for the weft core (spec §7 "Error Handling Design").
//!
//! Error kinds are closed and semantic, not structural. Each variant is
//! designed to be self-contained: an agent receiving this error should be
//! able to understand what happened and what to do next without
//! additional context — every `Display` impl carries a "To fix:" line.

use std::fmt;

use weft_retrieval::RetrievalError;

use crate::coordinator::error::CoordinatorError;
use crate::lock::error::LockError;
use crate::model::types::ValidationError;
use crate::pipeline::error::PipelineError;
use crate::tofs::error::ShadowFsError;

/// Unified error type for weft session operations.
#[derive(Debug)]
pub enum WeftError {
    /// The transactional overlay filesystem rejected an operation.
    ShadowFs(ShadowFsError),

    /// The soft-lock/conflict manager rejected an operation.
    Lock(LockError),

    /// The 8-step patch pipeline failed in a way that terminates the
    /// session (as opposed to a recoverable per-iteration step failure,
    /// which stays inside `PipelineResult.errors`).
    Pipeline(PipelineError),

    /// A domain value failed its constructor's invariant checks.
    Validation(ValidationError),

    /// The multi-agent coordinator rejected an operation.
    Coordinator(CoordinatorError),

    /// The hybrid retrieval pipeline failed to produce results.
    Retrieval(RetrievalError),

    /// A configuration file failed to parse or violated `deny_unknown_fields`.
    Config { path: String, detail: String },

    /// An I/O operation failed.
    Io(std::io::Error),
}

impl fmt::Display for WeftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShadowFs(e) => write!(f, "{e}"),
            Self::Lock(e) => write!(f, "{e}"),
            Self::Pipeline(e) => write!(f, "{e}"),
            Self::Coordinator(e) => write!(f, "{e}"),
            Self::Retrieval(e) => write!(f, "{e}"),
            Self::Validation(e) => write!(
                f,
                "{e}\nTo fix: check the value against the constructor's documented invariants before constructing."
            ),
            Self::Config { path, detail } => write!(
                f,
                "failed to load config at {path}: {detail}\nTo fix: verify the TOML syntax and that every key is a recognized config field."
            ),
            Self::Io(e) => write!(f, "I/O error: {e}\nTo fix: check file permissions and that the path exists."),
        }
    }
}

impl std::error::Error for WeftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::ShadowFs(e) => Some(e),
            Self::Lock(e) => Some(e),
            Self::Pipeline(e) => Some(e),
            Self::Coordinator(e) => Some(e),
            Self::Retrieval(e) => Some(e),
            Self::Validation(e) => Some(e),
            Self::Config { .. } => None,
        }
    }
}

impl From<std::io::Error> for WeftError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ValidationError> for WeftError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<ShadowFsError> for WeftError {
    fn from(e: ShadowFsError) -> Self {
        Self::ShadowFs(e)
    }
}

impl From<LockError> for WeftError {
    fn from(e: LockError) -> Self {
        Self::Lock(e)
    }
}

impl From<PipelineError> for WeftError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

impl From<CoordinatorError> for WeftError {
    fn from(e: CoordinatorError) -> Self {
        Self::Coordinator(e)
    }
}

impl From<RetrievalError> for WeftError {
    fn from(e: RetrievalError) -> Self {
        Self::Retrieval(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_has_fix_hint() {
        let ve = ValidationError {
            kind: crate::model::types::ErrorKind::RelPath,
            value: "x".into(),
            reason: "bad".into(),
        };
        let e: WeftError = ve.into();
        assert!(e.to_string().contains("To fix"));
    }

    #[test]
    fn io_error_converts_and_has_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: WeftError = io_err.into();
        assert!(std::error::Error::source(&e).is_some());
    }
}
