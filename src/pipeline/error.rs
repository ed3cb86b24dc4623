//! Pipeline error kinds (spec §7): carries the failing step number so
//! callers can tell a scope violation from a test-runner crash without
//! parsing the message.

use std::fmt;

#[derive(Debug)]
pub enum PipelineError {
    /// A capability port (LLM, sandbox, HCG) returned an error.
    PortFailure { step: u8, port: &'static str, detail: String },

    /// Step 1 (Scope) rejected the requested path set: a forbidden pattern
    /// matched, or more than `max_scope_paths` paths were requested.
    ScopeRejected { detail: String },

    /// The loop exhausted its budget before reaching a terminal patch.
    BudgetExhausted,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortFailure { step, port, detail } => write!(
                f,
                "step {step} ({port} port) failed: {detail}\nTo fix: inspect the {port} port's logs for the underlying cause."
            ),
            Self::ScopeRejected { detail } => write!(
                f,
                "scope rejected: {detail}\nTo fix: narrow the requested path set and avoid forbidden directories."
            ),
            Self::BudgetExhausted => write!(
                f,
                "loop budget exhausted before reaching a terminal state\nTo fix: raise the budget caps or investigate why convergence is slow."
            ),
        }
    }
}

impl std::error::Error for PipelineError {}
