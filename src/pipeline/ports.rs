//! Capability ports (spec §6): the pipeline's boundary to the LLM,
//! sandbox, and HCG. Modeled as trait objects, grounded on the
//! `IndexPlugin` capability-port shape (pack reference
//! `multi_index/ports/mod.rs`) — a narrow, explicitly-named trait per
//! external system rather than one god-trait.

use std::collections::BTreeMap;

use crate::model::contract::SpecResult;
use crate::model::patch::Patch;

/// Everything a port call can fail with, from the caller's perspective —
/// ports report free-form detail, and `PipelineError::PortFailure` at the
/// call site is what carries the step number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortError(pub String);

impl std::fmt::Display for PortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
impl std::error::Error for PortError {}

/// `generate_patch(task, paths, {path -> content}, feedback) -> Patch`
/// (spec §6 "LLM capability").
pub trait LlmPort {
    /// # Errors
    /// Returns `PortError` if the model call fails or its response cannot
    /// be parsed into at least one `{filename, body}` block.
    fn generate_patch(
        &self,
        task: &str,
        paths: &[String],
        content_by_path: &BTreeMap<String, String>,
        feedback: Option<&str>,
    ) -> Result<Patch, PortError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct LintResult {
    pub score: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestExecutionResult {
    pub pass_rate: f64,
    pub passed: u32,
    pub failed: u32,
    pub errors: Vec<String>,
    pub coverage: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoverageReport {
    pub branch: f64,
    pub line: f64,
    pub condition: f64,
    pub uncovered: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlakinessReport {
    pub ratio: f64,
    pub failed_count: u32,
    pub is_flaky: bool,
}

/// Spec §6 "Sandbox capability": syntax/lint/type/build/test execution in
/// an isolated environment. One method per operation, matching the
/// spec's flat method list rather than bundling everything behind one
/// `run` dispatch.
pub trait SandboxPort {
    /// # Errors
    /// Returns `PortError` on a sandbox infrastructure failure (not a
    /// syntax error in the code under test, which is reported as `Ok`
    /// with diagnostics).
    fn validate_syntax(&self, code: &str, lang: &str) -> Result<Vec<String>, PortError>;

    /// # Errors
    /// Returns `PortError` on sandbox infrastructure failure.
    fn run_linter(&self, patch: &Patch) -> Result<LintResult, PortError>;

    /// # Errors
    /// Returns `PortError` on sandbox infrastructure failure.
    fn run_type_check(&self, patch: &Patch) -> Result<Vec<String>, PortError>;

    /// # Errors
    /// Returns `PortError` on sandbox infrastructure failure.
    fn build(&self, patch: &Patch) -> Result<Vec<String>, PortError>;

    /// # Errors
    /// Returns `PortError` on sandbox infrastructure failure.
    fn execute_tests(&self, patch: &Patch) -> Result<TestExecutionResult, PortError>;

    /// # Errors
    /// Returns `PortError` on sandbox infrastructure failure.
    fn measure_coverage(&self, test: &str, target: &str) -> Result<CoverageReport, PortError>;

    /// # Errors
    /// Returns `PortError` on sandbox infrastructure failure.
    fn detect_flakiness(&self, test: &str, iterations: u32) -> Result<FlakinessReport, PortError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenameMap(pub BTreeMap<String, String>);

/// Spec §6 "HCG capability": the Hierarchical Code Graph that supplies
/// scope, caller/contract queries, rename detection, incremental
/// reindexing, and the three spec-validation checks.
pub trait HcgPort {
    /// # Errors
    /// Returns `PortError` on a query failure against the graph backend.
    fn query_scope(&self, task: &str, max_files: u32) -> Result<Vec<String>, PortError>;

    /// # Errors
    /// Returns `PortError` on a query failure.
    fn find_callers(&self, fqn: &str, version: &str) -> Result<Vec<String>, PortError>;

    /// # Errors
    /// Returns `PortError` on a query failure.
    fn extract_contract(&self, fqn: &str, version: &str) -> Result<Option<String>, PortError>;

    /// # Errors
    /// Returns `PortError` on a query failure.
    fn detect_renames(&self, patch: &Patch) -> Result<RenameMap, PortError>;

    /// Incremental re-index after a patch. Failures here are warnings
    /// (spec §4.4 S6), never terminal — callers should log `Ok(false)` or
    /// an `Err` and continue rather than abort the iteration.
    ///
    /// # Errors
    /// Returns `PortError` on a hard backend failure; callers treat this
    /// identically to `Ok(false)`.
    fn incremental_update(&self, patch: &Patch) -> Result<bool, PortError>;

    /// # Errors
    /// Returns `PortError` on a query failure.
    fn verify_architecture(&self, patch: &Patch) -> Result<SpecResult, PortError>;

    /// # Errors
    /// Returns `PortError` on a query failure.
    fn verify_security(&self, patch: &Patch) -> Result<SpecResult, PortError>;

    /// # Errors
    /// Returns `PortError` on a query failure.
    fn verify_integrity(&self, patch: &Patch) -> Result<SpecResult, PortError>;
}
