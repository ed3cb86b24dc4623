//! Operation trace logger for deterministic simulation testing (DST).
//!
//! Records state transitions as newline-delimited JSON (JSONL) for offline
//! analysis and replay. Each trace entry captures the operation performed,
//! pre/post state snapshots, and the oracle check results for that step.
//!
//! # Wire format
//!
//! Each line is a self-contained JSON object. See [`TraceEntry`] for the
//! schema.
//!
//! # Example
//!
//! ```rust,no_run
//! use weft_assurance::trace::{TraceEntry, TraceLogger, TraceOp, StateSnapshot, CheckResults};
//! use std::io::Cursor;
//!
//! let buf = Cursor::new(Vec::new());
//! let mut logger = TraceLogger::new(buf);
//! let pre = StateSnapshot::default();
//! // ... perform the operation ...
//! let post = StateSnapshot::default();
//! let entry = TraceEntry::new(1, TraceOp::AcquireLock, None, pre, post, CheckResults::all_pass());
//! logger.record(&entry).unwrap();
//! ```

use std::collections::BTreeMap;
use std::io::{self, BufWriter, Write};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The operation being traced. Maps 1:1 to the lock lifecycle plus the
/// patch loop's per-iteration phases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum TraceOp {
    /// `SoftLockManager::acquire_lock`.
    AcquireLock,
    /// `SoftLockManager::release_lock`.
    ReleaseLock,
    /// Lazy eviction of an expired lock on next touch.
    ExpireLock,
    /// One full pass through the 8-step pipeline.
    RunIteration,
    /// Convergence check declared the loop done.
    Converge,
    /// Oscillation detector fired.
    DetectOscillation,
    /// A resource budget cap was exceeded.
    AbortOnBudget,
}

/// Snapshot of pipeline/lock state at a point in time.
///
/// Deliberately uses simple types (strings, vecs, maps) rather than
/// `weft`'s internal domain types so trace files are self-contained and
/// readable without linking against the core crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateSnapshot {
    /// path -> (holder agent id, expires-at epoch ms).
    pub locks: BTreeMap<String, (String, u64)>,
    /// Current loop iteration number, 0 before the first run.
    pub iteration: u32,
    /// Tokens spent so far against the iteration budget.
    pub budget_spent_tokens: u64,
    /// Current loop status (`"running"`, `"converged"`, `"max_iterations"`,
    /// `"oscillating"`, `"aborted"`), empty string if no loop is active.
    pub loop_status: String,
}

/// Result of a single invariant check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckResult {
    Pass,
    Fail(String),
    Skip,
}

/// Results of the oracle's L1..L3/P1..P3 checks for one trace entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResults {
    pub l1: CheckResult,
    pub l2: CheckResult,
    pub l3: CheckResult,
    pub p1: CheckResult,
    pub p2: CheckResult,
    pub p3: CheckResult,
}

impl CheckResults {
    #[must_use]
    pub const fn all_pass() -> Self {
        Self {
            l1: CheckResult::Pass,
            l2: CheckResult::Pass,
            l3: CheckResult::Pass,
            p1: CheckResult::Pass,
            p2: CheckResult::Pass,
            p3: CheckResult::Pass,
        }
    }

    #[must_use]
    pub const fn all_skip() -> Self {
        Self {
            l1: CheckResult::Skip,
            l2: CheckResult::Skip,
            l3: CheckResult::Skip,
            p1: CheckResult::Skip,
            p2: CheckResult::Skip,
            p3: CheckResult::Skip,
        }
    }

    /// `true` if any check reported `Fail`.
    #[must_use]
    pub fn has_failure(&self) -> bool {
        [&self.l1, &self.l2, &self.l3, &self.p1, &self.p2, &self.p3]
            .into_iter()
            .any(|r| matches!(r, CheckResult::Fail(_)))
    }
}

/// A single trace entry — one JSON line in the trace log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Monotonically increasing sequence number (1-based).
    pub seq: u64,
    pub op: TraceOp,
    /// Which failpoint fired during this operation, if any.
    pub failpoint: Option<String>,
    pub pre: StateSnapshot,
    pub post: StateSnapshot,
    pub checks: CheckResults,
}

impl TraceEntry {
    #[must_use]
    pub const fn new(
        seq: u64,
        op: TraceOp,
        failpoint: Option<String>,
        pre: StateSnapshot,
        post: StateSnapshot,
        checks: CheckResults,
    ) -> Self {
        Self {
            seq,
            op,
            failpoint,
            pre,
            post,
            checks,
        }
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Appends `TraceEntry` values as JSONL to any `Write` sink.
pub struct TraceLogger<W: Write> {
    writer: BufWriter<W>,
    next_seq: u64,
}

impl<W: Write> TraceLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            next_seq: 1,
        }
    }

    /// Write `entry` as one JSON line, flushing immediately so a crash
    /// mid-run does not lose the last recorded step.
    ///
    /// # Errors
    /// Returns `io::Error` if serialization or the underlying write fails.
    pub fn record(&mut self, entry: &TraceEntry) -> io::Result<()> {
        let line = serde_json::to_string(entry).map_err(io::Error::other)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.next_seq = entry.seq + 1;
        Ok(())
    }

    /// The sequence number the next `TraceEntry` should use.
    #[must_use]
    pub const fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

/// Parses a JSONL trace file back into entries, in file order.
///
/// # Errors
/// Returns `io::Error` if a line is not valid JSON or does not match
/// [`TraceEntry`]'s schema.
pub fn replay(contents: &str) -> io::Result<Vec<TraceEntry>> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(io::Error::other))
        .collect()
}
