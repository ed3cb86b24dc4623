//! Patch/Hunk/FileChange domain model (spec §3 `Patch`, `Hunk`).
//!
//! A patch is a versioned, immutable aggregate over an ordered list of
//! per-file changes. Mutation is always construction of a new value
//! (`with_status`, `with_test_results`) — see DESIGN NOTES §9.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{RelPath, ValidationError};

// ---------------------------------------------------------------------------
// Hunk
// ---------------------------------------------------------------------------

/// A single unified-diff hunk: `(start_line, end_line, original_lines,
/// new_lines)`. Invariant: `end_line = start_line + |original_lines| − 1`
/// whenever `original_lines` is non-empty; at least one side non-empty;
/// empty-file diffs use `start_line = 1` by convention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    start_line: u32,
    end_line: u32,
    original_lines: Vec<String>,
    new_lines: Vec<String>,
}

impl Hunk {
    /// # Errors
    /// Returns `ValidationError` if `start_line < 1`, if `end_line <
    /// start_line`, if the `end_line = start_line + |original_lines| - 1`
    /// invariant is violated for a non-empty `original_lines`, or if both
    /// `original_lines` and `new_lines` are empty.
    pub fn new(
        start_line: u32,
        end_line: u32,
        original_lines: Vec<String>,
        new_lines: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let err = |reason: &str| ValidationError {
            kind: super::types::ErrorKind::RelPath, // reused: "structural" kind not separately modeled
            value: format!("Hunk(start={start_line}, end={end_line})"),
            reason: reason.to_string(),
        };
        if start_line < 1 {
            return Err(err("start_line must be >= 1"));
        }
        if end_line < start_line {
            return Err(err("end_line must be >= start_line"));
        }
        if original_lines.is_empty() && new_lines.is_empty() {
            return Err(err("at least one of original_lines/new_lines must be non-empty"));
        }
        if !original_lines.is_empty() {
            let expected_end = start_line + u32::try_from(original_lines.len()).unwrap_or(u32::MAX) - 1;
            if end_line != expected_end {
                return Err(err("end_line must equal start_line + |original_lines| - 1"));
            }
        }
        Ok(Self {
            start_line,
            end_line,
            original_lines,
            new_lines,
        })
    }

    /// A hunk representing the first write into a previously empty file:
    /// `start_line = 1` by the empty-file convention in spec §3/§8.
    #[must_use]
    pub fn for_empty_file_write(new_lines: Vec<String>) -> Self {
        Self {
            start_line: 1,
            end_line: 1,
            original_lines: Vec::new(),
            new_lines,
        }
    }

    #[must_use]
    pub const fn start_line(&self) -> u32 {
        self.start_line
    }

    #[must_use]
    pub const fn end_line(&self) -> u32 {
        self.end_line
    }

    #[must_use]
    pub fn original_lines(&self) -> &[String] {
        &self.original_lines
    }

    #[must_use]
    pub fn new_lines(&self) -> &[String] {
        &self.new_lines
    }
}

// ---------------------------------------------------------------------------
// FileChange
// ---------------------------------------------------------------------------

/// One file's change within a `Patch`. Invariants (spec §3): on `Modify`
/// both contents present and unequal; on `Create` only new content; on
/// `Delete` only old content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    path: RelPath,
    old_content: Option<String>,
    new_content: Option<String>,
    hunks: Vec<Hunk>,
}

impl FileChange {
    /// # Errors
    /// Returns `ValidationError` if the `Create`/`Modify`/`Delete`
    /// content-presence invariant is violated.
    pub fn new(
        path: RelPath,
        old_content: Option<String>,
        new_content: Option<String>,
        hunks: Vec<Hunk>,
    ) -> Result<Self, ValidationError> {
        let err = |reason: &str| ValidationError {
            kind: super::types::ErrorKind::RelPath,
            value: path.as_str().to_string(),
            reason: reason.to_string(),
        };
        match (&old_content, &new_content) {
            (None, None) => return Err(err("a FileChange must carry old and/or new content")),
            (Some(old), Some(new)) if old == new => {
                return Err(err("Modify requires old_content != new_content"));
            }
            _ => {}
        }
        Ok(Self {
            path,
            old_content,
            new_content,
            hunks,
        })
    }

    #[must_use]
    pub const fn path(&self) -> &RelPath {
        &self.path
    }

    #[must_use]
    pub fn old_content(&self) -> Option<&str> {
        self.old_content.as_deref()
    }

    #[must_use]
    pub fn new_content(&self) -> Option<&str> {
        self.new_content.as_deref()
    }

    #[must_use]
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    #[must_use]
    pub const fn is_create(&self) -> bool {
        self.old_content.is_none() && self.new_content.is_some()
    }

    #[must_use]
    pub const fn is_delete(&self) -> bool {
        self.old_content.is_some() && self.new_content.is_none()
    }

    #[must_use]
    pub const fn is_modify(&self) -> bool {
        self.old_content.is_some() && self.new_content.is_some()
    }
}

// ---------------------------------------------------------------------------
// PatchStatus / Patch
// ---------------------------------------------------------------------------

/// Status of a `Patch` as it moves through the pipeline (spec §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    Generated,
    Validated,
    Tested,
    Failed,
    Accepted,
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Generated => "generated",
            Self::Validated => "validated",
            Self::Tested => "tested",
            Self::Failed => "failed",
            Self::Accepted => "accepted",
        };
        f.write_str(s)
    }
}

/// Test-execution results recorded on a patch after Step 8 (spec §4.4).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    pub pass_rate: f64,
    pub passed: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

/// A versioned, immutable aggregate identified by `(id, iteration)` with an
/// ordered list of per-file changes (spec §3 `Patch`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    id: String,
    iteration: u32,
    files: Vec<FileChange>,
    status: PatchStatus,
    test_results: Option<TestResults>,
}

impl Patch {
    #[must_use]
    pub fn new(id: impl Into<String>, iteration: u32, files: Vec<FileChange>) -> Self {
        Self {
            id: id.into(),
            iteration,
            files,
            status: PatchStatus::Generated,
            test_results: None,
        }
    }

    /// A sentinel empty patch for pipeline-step failures before any file
    /// content exists, matching the original's `_create_empty_patch`.
    #[must_use]
    pub fn empty(id: impl Into<String>, iteration: u32) -> Self {
        Self {
            id: id.into(),
            iteration,
            files: Vec::new(),
            status: PatchStatus::Failed,
            test_results: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn iteration(&self) -> u32 {
        self.iteration
    }

    #[must_use]
    pub fn files(&self) -> &[FileChange] {
        &self.files
    }

    #[must_use]
    pub const fn status(&self) -> PatchStatus {
        self.status
    }

    #[must_use]
    pub fn test_results(&self) -> Option<&TestResults> {
        self.test_results.as_ref()
    }

    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.status, PatchStatus::Accepted)
    }

    #[must_use]
    pub fn with_status(&self, status: PatchStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_test_results(&self, results: TestResults) -> Self {
        Self {
            test_results: Some(results),
            ..self.clone()
        }
    }

    /// Total number of changed lines across all files' hunks — used by
    /// convergence/oscillation scoring.
    #[must_use]
    pub fn changed_line_count(&self) -> usize {
        self.files
            .iter()
            .flat_map(|f| f.hunks())
            .map(|h| h.original_lines().len() + h.new_lines().len())
            .sum()
    }

    /// Per-file set of changed (new) line contents, used by the oscillation
    /// detector's Jaccard similarity (spec §4.4).
    #[must_use]
    pub fn changed_lines_by_file(&self) -> std::collections::BTreeMap<String, std::collections::BTreeSet<String>> {
        let mut map = std::collections::BTreeMap::new();
        for file in &self.files {
            let lines: std::collections::BTreeSet<String> = file
                .hunks()
                .iter()
                .flat_map(|h| h.new_lines().iter().cloned())
                .collect();
            map.insert(file.path().as_str().to_string(), lines);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    #[test]
    fn hunk_enforces_end_line_invariant() {
        let h = Hunk::new(5, 7, vec!["a".into(), "b".into(), "c".into()], vec!["x".into()]);
        assert!(h.is_ok());
        let bad = Hunk::new(5, 8, vec!["a".into(), "b".into(), "c".into()], vec!["x".into()]);
        assert!(bad.is_err());
    }

    #[test]
    fn hunk_rejects_both_sides_empty() {
        assert!(Hunk::new(1, 1, vec![], vec![]).is_err());
    }

    #[test]
    fn hunk_for_empty_file_write_uses_start_line_one() {
        let h = Hunk::for_empty_file_write(vec!["hello".into()]);
        assert_eq!(h.start_line(), 1);
    }

    #[test]
    fn filechange_rejects_modify_with_equal_content() {
        let err = FileChange::new(path("a.txt"), Some("x".into()), Some("x".into()), vec![]);
        assert!(err.is_err());
    }

    #[test]
    fn filechange_rejects_no_content() {
        assert!(FileChange::new(path("a.txt"), None, None, vec![]).is_err());
    }

    #[test]
    fn filechange_classifies_create_modify_delete() {
        let create = FileChange::new(path("a.txt"), None, Some("x".into()), vec![]).unwrap();
        assert!(create.is_create());
        let modify = FileChange::new(path("a.txt"), Some("x".into()), Some("y".into()), vec![]).unwrap();
        assert!(modify.is_modify());
        let delete = FileChange::new(path("a.txt"), Some("x".into()), None, vec![]).unwrap();
        assert!(delete.is_delete());
    }

    #[test]
    fn patch_with_status_is_a_copy_update() {
        let p = Patch::new("p1", 0, vec![]);
        let accepted = p.with_status(PatchStatus::Accepted);
        assert_eq!(p.status(), PatchStatus::Generated);
        assert_eq!(accepted.status(), PatchStatus::Accepted);
    }

    #[test]
    fn empty_patch_is_failed_with_no_files() {
        let p = Patch::empty("empty", 0);
        assert!(p.files().is_empty());
        assert_eq!(p.status(), PatchStatus::Failed);
    }
}
