//! The `CodeGenLoop`-equivalent orchestrator (spec §4.4's control flow),
//! grounded on `codegen_loop.py`'s `CodeGenLoop.run()`: begin a
//! transaction, iterate the 8 steps, account the budget, decide
//! convergence/oscillation/acceptance/budget-exhaustion, and commit or roll
//! back on every exit path.

use crate::model::budget::Budget;
use crate::model::loop_state::{LoopState, LoopStatus, PipelineResult};
use crate::model::patch::{Patch, PatchStatus, TestResults};
use crate::model::types::RelPath;
use crate::tofs::path_canon::CaseSensitivity;
use crate::tofs::transaction::Transaction;

use super::convergence::{has_converged, DEFAULT_THRESHOLD};
use super::oscillation::{is_oscillating, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_WINDOW_SIZE};
use super::ports::{HcgPort, LlmPort, SandboxPort};
use super::steps;

/// Tunables pulled out of `Config` so the loop runner doesn't depend on the
/// whole config tree (spec §6 Config options relevant to C5).
#[derive(Clone, Copy, Debug)]
pub struct LoopConfig {
    pub max_files: u32,
    pub convergence_threshold: f64,
    pub oscillation_window_size: usize,
    pub oscillation_similarity_threshold: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_files: 20,
            convergence_threshold: DEFAULT_THRESHOLD,
            oscillation_window_size: DEFAULT_WINDOW_SIZE,
            oscillation_similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

pub struct LoopRunner<'a> {
    llm: &'a dyn LlmPort,
    sandbox: &'a dyn SandboxPort,
    hcg: &'a dyn HcgPort,
    config: LoopConfig,
}

impl<'a> LoopRunner<'a> {
    #[must_use]
    pub const fn new(llm: &'a dyn LlmPort, sandbox: &'a dyn SandboxPort, hcg: &'a dyn HcgPort, config: LoopConfig) -> Self {
        Self { llm, sandbox, hcg, config }
    }

    /// Run to a terminal `LoopState`, per spec §4.4's loop contract.
    #[must_use]
    pub fn run(
        &self,
        task_id: &str,
        task_description: &str,
        budget: Budget,
        disk_root: std::path::PathBuf,
    ) -> LoopState {
        let mut state = LoopState::new(task_id, budget);
        let watch_paths = self.scope_watch_paths(task_description);
        let mut txn = Transaction::begin(disk_root, CaseSensitivity::sensitive(), &watch_paths);
        let mut feedback: Option<String> = None;

        loop {
            if state.should_stop() {
                break;
            }
            let result = self.run_iteration(&mut txn, task_description, state.current_iteration(), feedback.as_deref());

            let iteration_tokens = estimate_tokens(&result.patch);
            let new_budget = state
                .budget()
                .with_usage(1, iteration_tokens, 0.0, result.llm_calls, result.test_runs);
            state = state.with_budget(new_budget);
            state = state.with_iteration(state.current_iteration() + 1);
            state = state.with_patch(result.patch.clone());

            feedback = if result.errors.is_empty() {
                None
            } else {
                Some(result.errors.join("; "))
            };

            if state.budget().is_exceeded() {
                state = state.with_status(LoopStatus::BudgetExceeded);
                break;
            }

            if result.patch.is_accepted() {
                let accepted = state.accepted_patches();
                if accepted.len() >= 2 {
                    let prev = accepted[accepted.len() - 2];
                    let latest = accepted[accepted.len() - 1];
                    if has_converged(prev, latest, self.config.convergence_threshold) {
                        state = state.with_status(LoopStatus::Converged);
                        break;
                    }
                }
                // Acceptance short-cut: commit immediately on an accepted patch
                // even without two accepted patches to compare (spec §4.4).
                state = state.with_status(LoopStatus::Converged);
                break;
            }

            if is_oscillating(
                state.patches(),
                self.config.oscillation_window_size,
                self.config.oscillation_similarity_threshold,
            ) {
                state = state.with_status(LoopStatus::Oscillating);
                break;
            }
        }

        match state.status() {
            LoopStatus::Converged => {
                let _ = txn.commit();
            }
            _ => txn.rollback(),
        }
        state
    }

    /// Resolve the task's scope once up front so the transaction can watch
    /// those paths for external drift (spec §4.1, §8 scenario 3). A failed
    /// scope query here isn't fatal — `run_iteration`'s own S1 call surfaces
    /// the real error; this just leaves drift detection empty for that run.
    fn scope_watch_paths(&self, task_description: &str) -> Vec<RelPath> {
        let Ok(paths) = steps::step1_scope(self.hcg, task_description, self.config.max_files) else {
            return Vec::new();
        };
        if steps::step2_safety(&paths).is_err() {
            return Vec::new();
        }
        paths.into_iter().filter_map(|p| RelPath::new(p).ok()).collect()
    }

    fn run_iteration(
        &self,
        txn: &mut Transaction,
        task: &str,
        iteration: u32,
        feedback: Option<&str>,
    ) -> PipelineResult {
        let empty = || PipelineResult {
            patch: Patch::empty(format!("{task}-{iteration}"), iteration),
            step_completed: 0,
            success: false,
            errors: Vec::new(),
            llm_calls: 0,
            test_runs: 0,
        };

        let paths = match steps::step1_scope(self.hcg, task, self.config.max_files) {
            Ok(p) => p,
            Err(e) => return empty().with_error(format!("S1: {e}")),
        };
        let mut result = PipelineResult { step_completed: 1, ..empty() };

        if let Err(e) = steps::step2_safety(&paths) {
            return result.with_error(format!("S2: {e}"));
        }
        result.step_completed = 2;

        let patch = match steps::step3_generate(self.llm, txn, task, &paths, feedback) {
            Ok(p) => p,
            Err(e) => return result.with_error(format!("S3: {e}")),
        };
        result.patch = patch.clone();
        result.llm_calls += 1;
        result.step_completed = 3;

        let lint = match steps::step4_lint_build_type(self.sandbox, &patch) {
            Ok(l) => l,
            Err(e) => return result.with_error(format!("S4: {e}")),
        };
        if !lint.is_ok() {
            result.patch = patch.with_status(PatchStatus::Failed);
            return result.with_error(format!("S4: {}", lint.errors.join("; ")));
        }
        result.patch = patch.clone().with_status(PatchStatus::Validated);
        result.step_completed = 4;

        let rename_violations = match steps::step5_semantic_contract(self.hcg, &patch, "HEAD") {
            Ok(v) => v,
            Err(e) => return result.with_error(format!("S5: {e}")),
        };
        if !rename_violations.is_empty() {
            result.patch = patch.with_status(PatchStatus::Failed);
            let detail = rename_violations
                .iter()
                .map(|v| format!("{} -> {} ({:?})", v.old_fqn, v.new_fqn, v.action))
                .collect::<Vec<_>>()
                .join("; ");
            return result.with_error(format!("S5: {detail}"));
        }
        result.step_completed = 5;

        // S6: warnings only, never terminal.
        if let Some(warning) = steps::step6_hcg_update(self.hcg, &patch) {
            result.errors.push(format!("S6 (warning): {warning}"));
        }
        result.step_completed = 6;

        let spec_result = match steps::step7_spec_validation(self.hcg, &patch) {
            Ok(r) => r,
            Err(e) => return result.with_error(format!("S7: {e}")),
        };
        if spec_result.has_critical_violation() {
            result.patch = patch.with_status(PatchStatus::Failed);
            return result.with_error("S7: critical spec violation".to_string());
        }
        result.step_completed = 7;

        let test_result = match steps::step8_tests(self.sandbox, &patch) {
            Ok(r) => r,
            Err(e) => return result.with_error(format!("S8: {e}")),
        };
        result.test_runs += 1;
        result.step_completed = 8;

        let status = if test_result.pass_rate >= 1.0 {
            PatchStatus::Accepted
        } else {
            PatchStatus::Failed
        };
        result.patch = patch.with_status(status).with_test_results(TestResults {
            pass_rate: test_result.pass_rate,
            passed: test_result.passed,
            failed: test_result.failed,
            errors: test_result.errors,
        });
        result.success = status == PatchStatus::Accepted;
        result
    }
}

fn estimate_tokens(patch: &Patch) -> u64 {
    #[allow(clippy::cast_possible_truncation)]
    {
        (patch.changed_line_count() * 8) as u64
    }
}
