//! Retrieval pipeline error kinds (spec §4.3, §7).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    /// A retrieval strategy panicked or returned malformed data. Per spec
    /// §4.3 ("strategy failures are logged and yield empty results"), this
    /// never aborts the pipeline — it is only raised if every strategy
    /// fails at once, leaving nothing to fuse.
    AllStrategiesFailed { query: String },

    /// The query was empty or whitespace-only.
    EmptyQuery,
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllStrategiesFailed { query } => write!(
                f,
                "every retrieval strategy failed for query {query:?}\nTo fix: check that the chunk index is populated and each strategy's dependencies are reachable."
            ),
            Self::EmptyQuery => write!(f, "query is empty\nTo fix: supply a non-whitespace query string."),
        }
    }
}

impl std::error::Error for RetrievalError {}
