//! Three-way merge for conflict resolution (spec §4.2 "Resolution flow"),
//! grounded directly on `merge/resolve.rs`'s `diff3_merge_bytes`: shell out
//! to `git merge-file -p --diff3` rather than adding a diff3 crate, since
//! git is already a required runtime dependency of the workspace backend.

use std::fs;
use std::process::Command;

#[derive(Debug)]
pub enum Merge3Error {
    Io(std::io::Error),
    GitCommand {
        stderr: String,
        exit_code: Option<i32>,
    },
}

impl std::fmt::Display for Merge3Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error running git merge-file: {e}"),
            Self::GitCommand { stderr, exit_code } => {
                write!(f, "git merge-file failed")?;
                if let Some(code) = exit_code {
                    write!(f, " (exit {code})")?;
                }
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Merge3Error {}

impl From<std::io::Error> for Merge3Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Outcome of a single three-way merge attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Merged cleanly; `content` is the final merged text.
    Clean(String),
    /// At least one overlapping edit; `marker_output` carries the raw
    /// `<<<<<<<`/`|||||||`/`=======`/`>>>>>>>` diff3 conflict markers for a
    /// human (or caller) to resolve.
    Conflict { marker_output: String },
}

/// Three-way merge `base`/`ours`/`theirs` via `git merge-file --diff3`.
///
/// # Errors
/// Returns `Merge3Error::Io` if temp files can't be written, or
/// `Merge3Error::GitCommand` if git exits with an unrecognized status.
pub fn three_way_merge(base: &str, ours: &str, theirs: &str) -> Result<MergeOutcome, Merge3Error> {
    let nonce: u64 = rand::random();
    let tmp_dir = std::env::temp_dir().join(format!("weft-merge3-{nonce}"));
    fs::create_dir_all(&tmp_dir)?;

    let ours_path = tmp_dir.join("ours.tmp");
    let base_path = tmp_dir.join("base.tmp");
    let theirs_path = tmp_dir.join("theirs.tmp");

    fs::write(&ours_path, ours)?;
    fs::write(&base_path, base)?;
    fs::write(&theirs_path, theirs)?;

    let output = Command::new("git")
        .arg("merge-file")
        .arg("-p")
        .arg("--diff3")
        .arg(&ours_path)
        .arg(&base_path)
        .arg(&theirs_path)
        .output()?;

    let _ = fs::remove_dir_all(&tmp_dir);

    match output.status.code() {
        Some(0) => Ok(MergeOutcome::Clean(String::from_utf8_lossy(&output.stdout).into_owned())),
        Some(n) if n > 0 => Ok(MergeOutcome::Conflict {
            marker_output: String::from_utf8_lossy(&output.stdout).into_owned(),
        }),
        code => Err(Merge3Error::GitCommand {
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: code,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_overlapping_edits_merge_cleanly() {
        let base = "line1\nline2\nline3\n";
        let ours = "line1-changed\nline2\nline3\n";
        let theirs = "line1\nline2\nline3-changed\n";
        let outcome = three_way_merge(base, ours, theirs).unwrap();
        match outcome {
            MergeOutcome::Clean(content) => {
                assert!(content.contains("line1-changed"));
                assert!(content.contains("line3-changed"));
            }
            MergeOutcome::Conflict { marker_output } => {
                panic!("expected clean merge, got conflict: {marker_output}")
            }
        }
    }

    #[test]
    fn overlapping_edits_produce_conflict_markers() {
        let base = "line1\n";
        let ours = "ours-version\n";
        let theirs = "theirs-version\n";
        let outcome = three_way_merge(base, ours, theirs).unwrap();
        match outcome {
            MergeOutcome::Conflict { marker_output } => {
                assert!(marker_output.contains("<<<<<<<"));
                assert!(marker_output.contains(">>>>>>>"));
            }
            MergeOutcome::Clean(content) => panic!("expected conflict, merged cleanly to: {content}"),
        }
    }
}
