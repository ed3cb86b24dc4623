//! Diff generation: turns an [`Overlay`]'s touched paths into domain
//! [`FileChange`]/[`Hunk`] values, and back into unified-diff text (spec §4.1
//! "Diff generation", spec §8's `compute_patch`/`to_unified_diff` round-trip
//! law).
//!
//! Line-level hunk computation is delegated to `similar`'s `TextDiff` rather
//! than hand-rolled, matching how the wider Rust ecosystem does text diffing.

use similar::{DiffTag, TextDiff};

use crate::model::patch::{FileChange, Hunk};

use super::overlay::{ChangeKind, FilePatch};
use super::Overlay;

fn strip_newline(s: &str) -> String {
    s.strip_suffix('\n').unwrap_or(s).to_string()
}

fn split_lines(s: &str) -> Vec<String> {
    s.split_inclusive('\n').map(strip_newline).collect()
}

/// Compute unified-diff-style hunks between `old` and `new` file content.
///
/// The empty-file case (`old` empty, `new` non-empty) always yields exactly
/// one [`Hunk::for_empty_file_write`] starting at line 1, per spec §8
/// scenario 1. Otherwise, each contiguous run of changed lines (as grouped
/// by `TextDiff::grouped_ops` with zero context) becomes one hunk.
#[must_use]
pub fn compute_hunks(old: &str, new: &str) -> Vec<Hunk> {
    if old.is_empty() {
        return if new.is_empty() {
            Vec::new()
        } else {
            vec![Hunk::for_empty_file_write(split_lines(new))]
        };
    }

    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new.split_inclusive('\n').collect();
    let diff = TextDiff::from_lines(old, new);

    let mut hunks = Vec::new();
    for group in diff.grouped_ops(0) {
        let mut old_start = usize::MAX;
        let mut old_end = 0usize;
        let mut original: Vec<String> = Vec::new();
        let mut updated: Vec<String> = Vec::new();

        for op in &group {
            let old_range = op.old_range();
            let new_range = op.new_range();
            old_start = old_start.min(old_range.start);
            old_end = old_end.max(old_range.end);
            match op.tag() {
                DiffTag::Delete => {
                    original.extend(old_range.map(|i| strip_newline(old_lines[i])));
                }
                DiffTag::Insert => {
                    updated.extend(new_range.map(|i| strip_newline(new_lines[i])));
                }
                DiffTag::Replace => {
                    original.extend(old_range.map(|i| strip_newline(old_lines[i])));
                    updated.extend(new_range.map(|i| strip_newline(new_lines[i])));
                }
                DiffTag::Equal => {}
            }
        }
        if original.is_empty() && updated.is_empty() {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let start_line = old_start as u32 + 1;
        let end_line = if original.is_empty() {
            start_line
        } else {
            #[allow(clippy::cast_possible_truncation)]
            {
                start_line + original.len() as u32 - 1
            }
        };
        if let Ok(hunk) = Hunk::new(start_line, end_line, original, updated) {
            hunks.push(hunk);
        }
    }
    hunks
}

/// Turn one [`FilePatch`] (old/new bytes) into a domain [`FileChange`] with
/// hunks, lossily decoding content as UTF-8 (matching
/// `Overlay::read_to_string_lossy`'s treatment of binary content).
///
/// Returns `None` for a path whose old and new content are byte-identical
/// (a write that reproduced the on-disk content verbatim carries no real
/// change) or whose `FileChange` invariants otherwise reject it.
#[must_use]
pub fn file_patch_to_change(patch: &FilePatch) -> Option<FileChange> {
    let old_str = patch
        .old_content
        .as_ref()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned());
    let new_str = patch
        .new_content
        .as_ref()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned());

    let hunks = match (old_str.as_deref(), new_str.as_deref()) {
        (Some(old), Some(new)) if old != new => compute_hunks(old, new),
        (None, Some(new)) => compute_hunks("", new),
        (Some(_), None) => Vec::new(),
        _ => return None,
    };

    FileChange::new(patch.path.clone(), old_str, new_str, hunks).ok()
}

/// Unified-diff text for one file change, suitable for a standard `patch`
/// tool to apply against the pre-image (spec §8's round-trip law).
#[must_use]
pub fn to_unified_diff(change: &FileChange) -> String {
    let old = change.old_content().unwrap_or("");
    let new = change.new_content().unwrap_or("");
    let path = change.path().as_str();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header(path, path)
        .to_string()
}

/// All `FileChange`s represented by an overlay's touched paths (spec §4.1
/// "Diff generation" applied to `Overlay::diff_vs_disk`).
#[must_use]
pub fn overlay_diff(overlay: &Overlay) -> Vec<FileChange> {
    overlay
        .diff_vs_disk()
        .iter()
        .filter_map(file_patch_to_change)
        .collect()
}

/// Paths with a `Modify` or `Add` change relative to disk.
#[must_use]
pub fn modified_paths(overlay: &Overlay) -> Vec<String> {
    overlay
        .diff_vs_disk()
        .into_iter()
        .filter(|p| matches!(p.kind, ChangeKind::Modify | ChangeKind::Add))
        .map(|p| p.path.as_str().to_string())
        .collect()
}

/// Paths with a `Delete` change relative to disk.
#[must_use]
pub fn deleted_paths(overlay: &Overlay) -> Vec<String> {
    overlay
        .diff_vs_disk()
        .into_iter()
        .filter(|p| matches!(p.kind, ChangeKind::Delete))
        .map(|p| p.path.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_write_yields_one_hunk_starting_at_line_one() {
        let hunks = compute_hunks("", "hello\n");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].start_line(), 1);
        assert_eq!(hunks[0].new_lines(), ["hello"]);
        assert!(hunks[0].original_lines().is_empty());
    }

    #[test]
    fn single_line_change_yields_one_hunk() {
        let old = "a\nb\nc\n";
        let new = "a\nx\nc\n";
        let hunks = compute_hunks(old, new);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].start_line(), 2);
        assert_eq!(hunks[0].original_lines(), ["b"]);
        assert_eq!(hunks[0].new_lines(), ["x"]);
    }

    #[test]
    fn identical_content_yields_no_hunks() {
        assert!(compute_hunks("same\n", "same\n").is_empty());
    }

    #[test]
    fn file_patch_to_change_skips_byte_identical_content() {
        let patch = FilePatch {
            path: crate::model::types::RelPath::new("a.txt").unwrap(),
            kind: ChangeKind::Modify,
            old_content: Some(b"same".to_vec()),
            new_content: Some(b"same".to_vec()),
        };
        assert!(file_patch_to_change(&patch).is_none());
    }

    #[test]
    fn unified_diff_contains_both_old_and_new_lines() {
        let change = FileChange::new(
            crate::model::types::RelPath::new("a.txt").unwrap(),
            Some("a\nb\n".to_string()),
            Some("a\nc\n".to_string()),
            compute_hunks("a\nb\n", "a\nc\n"),
        )
        .unwrap();
        let text = to_unified_diff(&change);
        assert!(text.contains("-b"));
        assert!(text.contains("+c"));
    }
}
