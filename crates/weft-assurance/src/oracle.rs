//! Invariant oracle for the soft-lock and patch-loop safety properties.
//!
//! Provides check functions that verify weft's safety guarantees hold
//! across state transitions. Each check takes a snapshot (or a pair of
//! pre/post snapshots) and returns `Ok(())` if the invariant holds, or
//! `Err(AssuranceViolation)` describing the violation. These are meant to
//! be called from a DST-style harness driving `SoftLockManager` and
//! `LoopRunner` directly, as a cheaper alternative to the exhaustive
//! `stateright` search in [`crate::model`] when only a handful of runs are
//! being checked.
//!
//! # Guarantees checked
//!
//! | Check | Guarantee |
//! |-------|-----------|
//! | L1 | Mutual exclusion: at most one live holder per path |
//! | L2 | Re-acquire by the current holder never shortens the TTL |
//! | L3 | A released path has no live holder afterward |
//! | P1 | The loop always reaches a terminal status within `max_iterations` |
//! | P2 | Budget spend is monotonically non-decreasing across iterations |
//! | P3 | The oscillation detector never fires on fewer than `2 * window_size` patches |

use std::collections::BTreeMap;
use std::fmt;

/// A point-in-time view of the lock store: path -> (holder, expires_at_ms).
pub type LockSnapshot = BTreeMap<String, (String, u64)>;

/// One step of a patch loop's iteration history, as seen by the oracle.
#[derive(Clone, Debug)]
pub struct LoopStep {
    pub iteration: u32,
    pub budget_spent_tokens: u64,
    pub status: LoopStatusView,
}

/// A simplified mirror of `crate::pipeline`'s loop status, used only for
/// equality checks (kept decoupled from `weft`'s domain types so this
/// crate never depends back on it).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopStatusView {
    Running,
    Converged,
    MaxIterationsReached,
    Oscillating,
    Aborted,
}

impl LoopStatusView {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// A single oracle violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssuranceViolation {
    pub check: &'static str,
    pub detail: String,
}

impl fmt::Display for AssuranceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.check, self.detail)
    }
}

impl std::error::Error for AssuranceViolation {}

fn violation(check: &'static str, detail: impl Into<String>) -> AssuranceViolation {
    AssuranceViolation {
        check,
        detail: detail.into(),
    }
}

/// L1: two snapshots that both claim a live holder for the same path must
/// agree on who it is. Catches a lock store that handed the same path to
/// two callers without the second going through `acquire_lock`'s conflict
/// path.
///
/// # Errors
/// Returns `AssuranceViolation` if `a` and `b` disagree on a path's holder
/// while both report it live.
pub fn check_l1_mutual_exclusion(
    a: &LockSnapshot,
    b: &LockSnapshot,
) -> Result<(), AssuranceViolation> {
    for (path, (holder_a, _)) in a {
        if let Some((holder_b, _)) = b.get(path) {
            if holder_a != holder_b {
                return Err(violation(
                    "L1",
                    format!("path {path} held by both {holder_a} and {holder_b}"),
                ));
            }
        }
    }
    Ok(())
}

/// L2: if the same agent holds `path` in both `before` and `after`, the
/// expiry must not have moved backward (re-acquire refreshes forward only).
///
/// # Errors
/// Returns `AssuranceViolation` if the same holder's expiry decreased.
pub fn check_l2_ttl_monotonic(
    before: &LockSnapshot,
    after: &LockSnapshot,
    path: &str,
) -> Result<(), AssuranceViolation> {
    let (Some((holder_before, expiry_before)), Some((holder_after, expiry_after))) =
        (before.get(path), after.get(path))
    else {
        return Ok(());
    };
    if holder_before == holder_after && expiry_after < expiry_before {
        return Err(violation(
            "L2",
            format!(
                "path {path}: expiry moved backward for holder {holder_after} ({expiry_before} -> {expiry_after})"
            ),
        ));
    }
    Ok(())
}

/// L3: after a release, `path` must not still show the released holder as
/// live (it may show a different holder who has since acquired it).
///
/// # Errors
/// Returns `AssuranceViolation` if `released_by` still appears as holder.
pub fn check_l3_release_clears_holder(
    after: &LockSnapshot,
    path: &str,
    released_by: &str,
) -> Result<(), AssuranceViolation> {
    if let Some((holder, _)) = after.get(path) {
        if holder == released_by {
            return Err(violation(
                "L3",
                format!("path {path} still shows released holder {released_by}"),
            ));
        }
    }
    Ok(())
}

/// P1: scanning a loop's step history, the first terminal status must
/// appear at or before `max_iterations`, and no step after it should exist
/// (the runner must stop driving iterations once terminal).
///
/// # Errors
/// Returns `AssuranceViolation` if the loop ran past a terminal status or
/// never reached one within `max_iterations`.
pub fn check_p1_terminates(
    history: &[LoopStep],
    max_iterations: u32,
) -> Result<(), AssuranceViolation> {
    let mut seen_terminal_at: Option<u32> = None;
    for step in history {
        if let Some(at) = seen_terminal_at {
            return Err(violation(
                "P1",
                format!(
                    "loop continued to iteration {} after reaching terminal status at {at}",
                    step.iteration
                ),
            ));
        }
        if step.status.is_terminal() {
            seen_terminal_at = Some(step.iteration);
        }
    }
    match seen_terminal_at {
        Some(at) if at <= max_iterations => Ok(()),
        Some(at) => Err(violation(
            "P1",
            format!("terminal status reached at iteration {at}, past max_iterations {max_iterations}"),
        )),
        None if history.len() as u32 >= max_iterations => Err(violation(
            "P1",
            format!("no terminal status within {max_iterations} iterations"),
        )),
        None => Ok(()),
    }
}

/// P2: budget spend never decreases step over step.
///
/// # Errors
/// Returns `AssuranceViolation` on the first step where spend decreased.
pub fn check_p2_budget_monotonic(history: &[LoopStep]) -> Result<(), AssuranceViolation> {
    for pair in history.windows(2) {
        let [prev, next] = pair else { continue };
        if next.budget_spent_tokens < prev.budget_spent_tokens {
            return Err(violation(
                "P2",
                format!(
                    "budget spend decreased at iteration {}: {} -> {}",
                    next.iteration, prev.budget_spent_tokens, next.budget_spent_tokens
                ),
            ));
        }
    }
    Ok(())
}

/// P3: the oscillation detector must not report `Oscillating` before
/// `2 * window_size` patches have accumulated.
///
/// # Errors
/// Returns `AssuranceViolation` if oscillation was reported too early.
pub fn check_p3_oscillation_needs_history(
    patch_count_at_detection: usize,
    window_size: usize,
) -> Result<(), AssuranceViolation> {
    if patch_count_at_detection < window_size * 2 {
        return Err(violation(
            "P3",
            format!(
                "oscillation reported with only {patch_count_at_detection} patches, needs {}",
                window_size * 2
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l1_agrees_on_shared_holder() {
        let mut a = LockSnapshot::new();
        a.insert("f.rs".into(), ("agent-1".into(), 1000));
        let b = a.clone();
        assert!(check_l1_mutual_exclusion(&a, &b).is_ok());
    }

    #[test]
    fn l1_flags_disagreement() {
        let mut a = LockSnapshot::new();
        a.insert("f.rs".into(), ("agent-1".into(), 1000));
        let mut b = LockSnapshot::new();
        b.insert("f.rs".into(), ("agent-2".into(), 1000));
        assert!(check_l1_mutual_exclusion(&a, &b).is_err());
    }

    #[test]
    fn l2_allows_forward_refresh() {
        let mut before = LockSnapshot::new();
        before.insert("f.rs".into(), ("agent-1".into(), 1000));
        let mut after = LockSnapshot::new();
        after.insert("f.rs".into(), ("agent-1".into(), 2000));
        assert!(check_l2_ttl_monotonic(&before, &after, "f.rs").is_ok());
    }

    #[test]
    fn l2_flags_backward_expiry() {
        let mut before = LockSnapshot::new();
        before.insert("f.rs".into(), ("agent-1".into(), 2000));
        let mut after = LockSnapshot::new();
        after.insert("f.rs".into(), ("agent-1".into(), 1000));
        assert!(check_l2_ttl_monotonic(&before, &after, "f.rs").is_err());
    }

    #[test]
    fn l3_flags_lingering_holder() {
        let mut after = LockSnapshot::new();
        after.insert("f.rs".into(), ("agent-1".into(), 1000));
        assert!(check_l3_release_clears_holder(&after, "f.rs", "agent-1").is_err());
        after.remove("f.rs");
        assert!(check_l3_release_clears_holder(&after, "f.rs", "agent-1").is_ok());
    }

    #[test]
    fn p1_detects_continuation_past_terminal() {
        let history = vec![
            LoopStep { iteration: 1, budget_spent_tokens: 10, status: LoopStatusView::Running },
            LoopStep { iteration: 2, budget_spent_tokens: 20, status: LoopStatusView::Converged },
            LoopStep { iteration: 3, budget_spent_tokens: 30, status: LoopStatusView::Running },
        ];
        assert!(check_p1_terminates(&history, 20).is_err());
    }

    #[test]
    fn p1_accepts_clean_termination() {
        let history = vec![
            LoopStep { iteration: 1, budget_spent_tokens: 10, status: LoopStatusView::Running },
            LoopStep { iteration: 2, budget_spent_tokens: 20, status: LoopStatusView::Converged },
        ];
        assert!(check_p1_terminates(&history, 20).is_ok());
    }

    #[test]
    fn p2_detects_budget_regression() {
        let history = vec![
            LoopStep { iteration: 1, budget_spent_tokens: 100, status: LoopStatusView::Running },
            LoopStep { iteration: 2, budget_spent_tokens: 50, status: LoopStatusView::Running },
        ];
        assert!(check_p2_budget_monotonic(&history).is_err());
    }

    #[test]
    fn p3_rejects_premature_oscillation_report() {
        assert!(check_p3_oscillation_needs_history(4, 3).is_err());
        assert!(check_p3_oscillation_needs_history(6, 3).is_ok());
    }
}
