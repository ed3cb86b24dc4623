//! The 8 pipeline steps (spec §4.4), grounded almost verbatim-in-spirit on
//! `codegen_loop.py`'s `_run_pipeline` — including its literal
//! forbidden-pattern list and 50-path scope cap, both supplemented as
//! named constants beyond spec.md's prose.

use std::collections::BTreeMap;

use crate::model::contract::SpecResult;
use crate::model::patch::Patch;
use crate::tofs::transaction::Transaction;

use super::error::PipelineError;
use super::ports::{HcgPort, LlmPort, PortError, SandboxPort};

/// Paths matching any of these substrings are rejected by S2 regardless of
/// scope (spec §4.4 S2, constant lifted from `codegen_loop.py`).
pub const FORBIDDEN_PATH_PATTERNS: &[&str] = &["__pycache__", ".git", "node_modules", ".env", "secrets"];

/// `|paths| > 50` fails S2 (spec §4.4 S2).
pub const MAX_SCOPE_PATHS: usize = 50;

/// Lint score below this fails S4 (spec §4.4 S4).
pub const MIN_LINT_SCORE: f64 = 0.8;

/// Heuristic rename-detection threshold when the planner didn't supply an
/// explicit rename list (spec §4.4 S5: "body similarity >= 0.85").
pub const RENAME_BODY_SIMILARITY_THRESHOLD: f64 = 0.85;

// ---------------------------------------------------------------------------
// S1: Scope selection
// ---------------------------------------------------------------------------

/// # Errors
/// Returns `PipelineError::PortFailure` if the HCG query fails, or
/// `PipelineError::ScopeRejected` if the query returns no paths (an empty
/// scope is a terminal failure — it would otherwise loop forever).
pub fn step1_scope(hcg: &dyn HcgPort, task: &str, max_files: u32) -> Result<Vec<String>, PipelineError> {
    let paths = hcg
        .query_scope(task, max_files)
        .map_err(|e| port_err(1, "hcg", e))?;
    if paths.is_empty() {
        return Err(PipelineError::ScopeRejected {
            detail: "HCG scope query returned no paths".to_string(),
        });
    }
    Ok(paths)
}

// ---------------------------------------------------------------------------
// S2: Safety filters
// ---------------------------------------------------------------------------

/// # Errors
/// Returns `PipelineError::ScopeRejected` if a forbidden pattern matches
/// any path, or if `|paths| > MAX_SCOPE_PATHS`.
pub fn step2_safety(paths: &[String]) -> Result<(), PipelineError> {
    if paths.len() > MAX_SCOPE_PATHS {
        return Err(PipelineError::ScopeRejected {
            detail: format!("{} paths exceeds the {MAX_SCOPE_PATHS}-path scope cap", paths.len()),
        });
    }
    for path in paths {
        if let Some(pattern) = FORBIDDEN_PATH_PATTERNS.iter().find(|p| path.contains(**p)) {
            return Err(PipelineError::ScopeRejected {
                detail: format!("{path} matches forbidden pattern `{pattern}`"),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// S3: LLM patch generation
// ---------------------------------------------------------------------------

/// # Errors
/// Returns `PipelineError::PortFailure` if the LLM call fails.
pub fn step3_generate(
    llm: &dyn LlmPort,
    txn: &mut Transaction,
    task: &str,
    paths: &[String],
    feedback: Option<&str>,
) -> Result<Patch, PipelineError> {
    let mut content_by_path = BTreeMap::new();
    for path in paths {
        if let Ok(rel) = crate::model::types::RelPath::new(path.clone()) {
            if let Some(content) = txn.overlay().read_to_string_lossy(&rel) {
                content_by_path.insert(path.clone(), content);
            }
        }
    }
    let patch = llm
        .generate_patch(task, paths, &content_by_path, feedback)
        .map_err(|e| port_err(3, "llm", e))?;

    for file in patch.files() {
        if let Some(new_content) = file.new_content() {
            let _ = txn.overlay_mut().write(file.path(), new_content.as_bytes().to_vec());
            txn.ir_cache_mut().get_or_parse_ir(file.path().as_str(), new_content);
        } else if file.is_delete() {
            let _ = txn.overlay_mut().delete(file.path());
        }
    }
    Ok(patch)
}

// ---------------------------------------------------------------------------
// S4: Lint / build / type-check
// ---------------------------------------------------------------------------

/// Accumulated step-4 failures (spec §4.4 S4: "any step's failures
/// short-circuit the iteration").
#[derive(Debug, Default)]
pub struct LintBuildResult {
    pub errors: Vec<String>,
}

impl LintBuildResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// # Errors
/// Returns `PipelineError::PortFailure` if the sandbox itself is
/// unreachable; per-file/per-stage failures accumulate in the returned
/// `LintBuildResult` instead of short-circuiting via `Err`.
pub fn step4_lint_build_type(sandbox: &dyn SandboxPort, patch: &Patch) -> Result<LintBuildResult, PipelineError> {
    let mut result = LintBuildResult::default();

    for file in patch.files() {
        if let Some(content) = file.new_content() {
            let lang = lang_from_path(file.path().as_str());
            let diagnostics = sandbox
                .validate_syntax(content, lang)
                .map_err(|e| port_err(4, "sandbox", e))?;
            result.errors.extend(diagnostics);
        }
    }
    if !result.errors.is_empty() {
        return Ok(result);
    }

    let lint = sandbox.run_linter(patch).map_err(|e| port_err(4, "sandbox", e))?;
    if lint.score < MIN_LINT_SCORE {
        result.errors.extend(lint.errors);
    }

    result.errors.extend(sandbox.run_type_check(patch).map_err(|e| port_err(4, "sandbox", e))?);
    result.errors.extend(sandbox.build(patch).map_err(|e| port_err(4, "sandbox", e))?);

    Ok(result)
}

fn lang_from_path(path: &str) -> &'static str {
    if path.ends_with(".rs") {
        "rust"
    } else if path.ends_with(".py") {
        "python"
    } else if path.ends_with(".ts") || path.ends_with(".tsx") {
        "typescript"
    } else {
        "text"
    }
}

// ---------------------------------------------------------------------------
// S5: Semantic-contract validation
// ---------------------------------------------------------------------------

/// What action S5 recommends when a rename fails validation (spec §4.4 S5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameAction {
    UpdateCallersFirst,
    RenameAndSignatureMustBeSeparate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenameViolation {
    pub old_fqn: String,
    pub new_fqn: String,
    pub action: RenameAction,
}

/// # Errors
/// Returns `PipelineError::PortFailure` if the HCG rename/caller queries
/// fail.
pub fn step5_semantic_contract(
    hcg: &dyn HcgPort,
    patch: &Patch,
    version: &str,
) -> Result<Vec<RenameViolation>, PipelineError> {
    let renames = hcg.detect_renames(patch).map_err(|e| port_err(5, "hcg", e))?;
    let mut violations = Vec::new();

    for (old_fqn, new_fqn) in &renames.0 {
        let signature_changed = hcg
            .extract_contract(old_fqn, version)
            .map_err(|e| port_err(5, "hcg", e))?
            .is_none();
        if signature_changed {
            violations.push(RenameViolation {
                old_fqn: old_fqn.clone(),
                new_fqn: new_fqn.clone(),
                action: RenameAction::RenameAndSignatureMustBeSeparate,
            });
            continue;
        }

        let callers = hcg.find_callers(old_fqn, version).map_err(|e| port_err(5, "hcg", e))?;
        let patched_paths: std::collections::BTreeSet<&str> =
            patch.files().iter().map(|f| f.path().as_str()).collect();
        let all_callers_updated = callers.iter().all(|c| patched_paths.contains(c.as_str()));
        if !all_callers_updated {
            violations.push(RenameViolation {
                old_fqn: old_fqn.clone(),
                new_fqn: new_fqn.clone(),
                action: RenameAction::UpdateCallersFirst,
            });
        }
    }

    Ok(violations)
}

// ---------------------------------------------------------------------------
// S6: HCG incremental update (warnings only, never terminal)
// ---------------------------------------------------------------------------

#[must_use]
pub fn step6_hcg_update(hcg: &dyn HcgPort, patch: &Patch) -> Option<String> {
    match hcg.incremental_update(patch) {
        Ok(true) => None,
        Ok(false) => Some("HCG incremental update reported no-op/failure".to_string()),
        Err(e) => Some(format!("HCG incremental update warning: {e}")),
    }
}

// ---------------------------------------------------------------------------
// S7: Spec validation
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SpecValidationResult {
    pub architecture: Option<SpecResult>,
    pub security: Option<SpecResult>,
    pub integrity: Option<SpecResult>,
}

impl SpecValidationResult {
    #[must_use]
    pub fn has_critical_violation(&self) -> bool {
        [&self.architecture, &self.security, &self.integrity]
            .into_iter()
            .flatten()
            .any(|r| !r.passed())
    }
}

/// # Errors
/// Returns `PipelineError::PortFailure` if any of the three HCG
/// spec-validation queries fail outright.
pub fn step7_spec_validation(hcg: &dyn HcgPort, patch: &Patch) -> Result<SpecValidationResult, PipelineError> {
    Ok(SpecValidationResult {
        architecture: Some(hcg.verify_architecture(patch).map_err(|e| port_err(7, "hcg", e))?),
        security: Some(hcg.verify_security(patch).map_err(|e| port_err(7, "hcg", e))?),
        integrity: Some(hcg.verify_integrity(patch).map_err(|e| port_err(7, "hcg", e))?),
    })
}

// ---------------------------------------------------------------------------
// S8: Test execution
// ---------------------------------------------------------------------------

/// # Errors
/// Returns `PipelineError::PortFailure` if the sandbox itself fails to run
/// the test suite.
pub fn step8_tests(sandbox: &dyn SandboxPort, patch: &Patch) -> Result<super::ports::TestExecutionResult, PipelineError> {
    sandbox.execute_tests(patch).map_err(|e| port_err(8, "sandbox", e))
}

fn port_err(step: u8, port: &'static str, e: PortError) -> PipelineError {
    PipelineError::PortFailure {
        step,
        port,
        detail: e.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step2_rejects_forbidden_pattern() {
        let paths = vec!["src/main.rs".to_string(), ".git/HEAD".to_string()];
        assert!(step2_safety(&paths).is_err());
    }

    #[test]
    fn step2_rejects_oversized_scope() {
        let paths: Vec<String> = (0..51).map(|i| format!("f{i}.rs")).collect();
        assert!(step2_safety(&paths).is_err());
    }

    #[test]
    fn step2_accepts_clean_scope() {
        let paths = vec!["src/main.rs".to_string(), "src/lib.rs".to_string()];
        assert!(step2_safety(&paths).is_ok());
    }
}
