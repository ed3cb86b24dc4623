//! Loop state machine (spec §3 `LoopState`, §4.4's control flow).
//!
//! Invariant: status may only transition from `Running` to any terminal
//! value; once terminal, state is frozen. All mutators return a new state.

use serde::{Deserialize, Serialize};

use super::budget::Budget;
use super::patch::Patch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    Running,
    Converged,
    Oscillating,
    BudgetExceeded,
    Failed,
    Aborted,
}

impl LoopStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Result of one 8-step pipeline iteration (spec §4.4's `PipelineResult`).
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineResult {
    pub patch: Patch,
    pub step_completed: u8,
    pub success: bool,
    pub errors: Vec<String>,
    pub llm_calls: u32,
    pub test_runs: u32,
}

impl PipelineResult {
    #[must_use]
    pub fn with_error(&self, error: impl Into<String>) -> Self {
        let mut errors = self.errors.clone();
        errors.push(error.into());
        Self {
            success: false,
            errors,
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoopState {
    task_id: String,
    status: LoopStatus,
    current_iteration: u32,
    patches: Vec<Patch>,
    budget: Budget,
    best_patch: Option<Patch>,
    convergence_score: f64,
}

impl LoopState {
    #[must_use]
    pub fn new(task_id: impl Into<String>, budget: Budget) -> Self {
        Self {
            task_id: task_id.into(),
            status: LoopStatus::Running,
            current_iteration: 0,
            patches: Vec::new(),
            budget,
            best_patch: None,
            convergence_score: 0.0,
        }
    }

    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    #[must_use]
    pub const fn status(&self) -> LoopStatus {
        self.status
    }

    #[must_use]
    pub const fn current_iteration(&self) -> u32 {
        self.current_iteration
    }

    #[must_use]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    #[must_use]
    pub const fn budget(&self) -> &Budget {
        &self.budget
    }

    #[must_use]
    pub fn best_patch(&self) -> Option<&Patch> {
        self.best_patch.as_ref()
    }

    #[must_use]
    pub const fn convergence_score(&self) -> f64 {
        self.convergence_score
    }

    /// Append a patch, replacing `best_patch` if the new patch has a higher
    /// recorded test pass-rate. A state whose status is already terminal is
    /// returned unchanged (spec §8's "if S1.status != Running then S1 =
    /// S2" invariant).
    #[must_use]
    pub fn with_patch(&self, patch: Patch) -> Self {
        if self.status.is_terminal() {
            return self.clone();
        }
        let best_patch = Self::pick_best(self.best_patch.as_ref(), &patch);
        let mut patches = self.patches.clone();
        patches.push(patch);
        Self {
            patches,
            best_patch,
            ..self.clone()
        }
    }

    fn pick_best(current_best: Option<&Patch>, candidate: &Patch) -> Option<Patch> {
        let Some(candidate_results) = candidate.test_results() else {
            return current_best.cloned();
        };
        match current_best {
            None => Some(candidate.clone()),
            Some(best) => match best.test_results() {
                None => Some(candidate.clone()),
                Some(best_results) if candidate_results.pass_rate > best_results.pass_rate => {
                    Some(candidate.clone())
                }
                _ => Some(best.clone()),
            },
        }
    }

    #[must_use]
    pub fn with_status(&self, status: LoopStatus) -> Self {
        if self.status.is_terminal() {
            return self.clone();
        }
        Self {
            status,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_budget(&self, budget: Budget) -> Self {
        if self.status.is_terminal() {
            return self.clone();
        }
        Self { budget, ..self.clone() }
    }

    #[must_use]
    pub fn with_iteration(&self, iteration: u32) -> Self {
        if self.status.is_terminal() {
            return self.clone();
        }
        Self {
            current_iteration: iteration,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_convergence_score(&self, score: f64) -> Self {
        if self.status.is_terminal() {
            return self.clone();
        }
        Self {
            convergence_score: score,
            ..self.clone()
        }
    }

    /// Cooperative-cancellation check (spec §5): terminal status, budget
    /// exhaustion, or a sufficiently-converged accepted best patch.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.status != LoopStatus::Running
            || self.budget.is_exceeded()
            || self
                .best_patch
                .as_ref()
                .is_some_and(|p| p.is_accepted() && self.convergence_score > 0.95)
    }

    #[must_use]
    pub fn recent_patches(&self, n: usize) -> &[Patch] {
        let len = self.patches.len();
        &self.patches[len.saturating_sub(n)..]
    }

    #[must_use]
    pub fn accepted_patches(&self) -> Vec<&Patch> {
        self.patches.iter().filter(|p| p.is_accepted()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::patch::PatchStatus;

    fn patch(status: PatchStatus) -> Patch {
        Patch::new("p", 0, vec![]).with_status(status)
    }

    #[test]
    fn terminal_state_is_frozen() {
        let s = LoopState::new("t1", Budget::default());
        let converged = s.with_status(LoopStatus::Converged);
        let mutated = converged.with_iteration(5);
        assert_eq!(mutated.current_iteration(), 0);
        assert_eq!(mutated.status(), LoopStatus::Converged);
    }

    #[test]
    fn with_patch_updates_best_by_pass_rate() {
        use crate::model::patch::TestResults;
        let s = LoopState::new("t1", Budget::default());
        let p1 = patch(PatchStatus::Failed).with_test_results(TestResults {
            pass_rate: 0.5,
            passed: 1,
            failed: 1,
            errors: vec![],
        });
        let s = s.with_patch(p1);
        let p2 = patch(PatchStatus::Accepted).with_test_results(TestResults {
            pass_rate: 1.0,
            passed: 2,
            failed: 0,
            errors: vec![],
        });
        let s = s.with_patch(p2.clone());
        assert_eq!(s.best_patch().unwrap().test_results().unwrap().pass_rate, 1.0);
    }

    #[test]
    fn should_stop_on_budget_exhaustion() {
        let budget = Budget::default().with_usage(10, 0, 0.0, 0, 0);
        let s = LoopState::new("t1", budget);
        assert!(s.should_stop());
    }

    #[test]
    fn should_not_stop_when_running_under_budget() {
        let s = LoopState::new("t1", Budget::default());
        assert!(!s.should_stop());
    }
}
