//! Formal-verification primitives for weft: an invariant oracle, a trace
//! logger for deterministic replay, and (behind the `stateright` feature) a
//! pair of `stateright::Model` implementations covering the two invariants
//! spec §4.2/§4.4 call out as safety-critical: soft-lock mutual exclusion
//! and patch-loop termination.
//!
//! - [`oracle`] — the `check_*` functions, callable from DST-style harnesses
//!   that exercise `SoftLockManager`/`LoopRunner` directly without pulling
//!   in `stateright`.
//! - [`trace`] — `TraceLogger`/`TraceEntry`, JSONL operation trace for
//!   offline replay of a failing run.
//! - [`model`] (feature `stateright`) — exhaustive state-space search over
//!   small agent/path counts and small iteration bounds.

pub mod oracle;
pub mod trace;

#[cfg(feature = "stateright")]
pub mod model;
