//! Materialization of the overlay to real paths for external tools (spec
//! §4.1 "Materialization"): linters, type checkers, and test runners need a
//! real directory tree, not an in-memory union.
//!
//! Grounded on `overlay.rs`'s symlink-or-copy mount strategy choice,
//! repurposed per-directory rather than per-mount: unmodified directories
//! are symlinked wholesale (cheap), directories containing overlay writes
//! or tombstones are deep-copied with the overlay applied on top.

use std::fs;
use std::path::{Path, PathBuf};

use crate::model::types::RelPath;

use super::error::ShadowFsError;
use super::overlay::Overlay;
use super::path_canon::resolve_within_jail;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterializeStrategy {
    /// Symlink the original disk directory directly; nothing underneath it
    /// was touched by the overlay.
    Symlink,
    /// Deep-copy the directory and re-apply overlay writes/tombstones on
    /// top of the copy.
    DeepCopy,
}

/// A materialized scratch tree. Dropping this value does not delete the
/// directory — call `cleanup` explicitly once the external tool has run,
/// mirroring the teacher's explicit `destroy()` step rather than a `Drop`
/// impl, so failures during cleanup surface as a normal `Result`.
pub struct Materialized {
    pub root: PathBuf,
}

/// Materialize `overlay` under a fresh temp directory, choosing a strategy
/// per top-level entry of the disk root.
///
/// # Errors
/// Returns `ShadowFsError::Io`/`DiskFull` if the copy fails, or
/// `ShadowFsError::Security` if a path resolves outside the jail.
pub fn prepare_for_external_tool(overlay: &Overlay) -> Result<Materialized, ShadowFsError> {
    let scratch = tempfile::Builder::new()
        .prefix("weft-materialize-")
        .tempdir()
        .map_err(ShadowFsError::Io)?;
    let root = scratch.into_path();

    let touched_dirs = top_level_dirs_touched(overlay);

    for entry in fs::read_dir(overlay.disk_root()).map_err(ShadowFsError::Io)? {
        let entry = entry.map_err(ShadowFsError::Io)?;
        let name = entry.file_name();
        let src = entry.path();
        let dst = root.join(&name);
        let strategy = if touched_dirs.contains(&name.to_string_lossy().into_owned())
            || resolve_within_jail(overlay.disk_root(), &name.to_string_lossy()).is_err()
        {
            MaterializeStrategy::DeepCopy
        } else {
            MaterializeStrategy::Symlink
        };
        match strategy {
            MaterializeStrategy::Symlink => symlink_entry(&src, &dst)?,
            MaterializeStrategy::DeepCopy => {
                copy_recursive(&src, &dst)?;
            }
        }
    }

    apply_overlay_writes(overlay, &root)?;

    Ok(Materialized { root })
}

fn top_level_dirs_touched(overlay: &Overlay) -> Vec<String> {
    let mut dirs = Vec::new();
    let touched = overlay
        .overlay_entries()
        .keys()
        .chain(overlay.tombstones().iter());
    for path in touched {
        if let Some(first) = path.as_str().split('/').next() {
            let first = first.to_string();
            if !dirs.contains(&first) {
                dirs.push(first);
            }
        }
    }
    dirs
}

fn apply_overlay_writes(overlay: &Overlay, root: &Path) -> Result<(), ShadowFsError> {
    for (path, content) in overlay.overlay_entries() {
        let dst = root.join(path.as_str());
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(ShadowFsError::Io)?;
        }
        fs::write(&dst, content).map_err(ShadowFsError::Io)?;
    }
    for path in overlay.tombstones() {
        let dst = root.join(path.as_str());
        if dst.exists() {
            fs::remove_file(&dst).map_err(ShadowFsError::Io)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink_entry(src: &Path, dst: &Path) -> Result<(), ShadowFsError> {
    std::os::unix::fs::symlink(src, dst).map_err(ShadowFsError::Io)
}

#[cfg(not(unix))]
fn symlink_entry(src: &Path, dst: &Path) -> Result<(), ShadowFsError> {
    copy_recursive(src, dst)
}

fn copy_recursive(src: &Path, dst: &Path) -> Result<(), ShadowFsError> {
    if src.is_dir() {
        fs::create_dir_all(dst).map_err(ShadowFsError::Io)?;
        for entry in fs::read_dir(src).map_err(ShadowFsError::Io)? {
            let entry = entry.map_err(ShadowFsError::Io)?;
            copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
        }
    } else {
        fs::copy(src, dst).map_err(ShadowFsError::Io)?;
    }
    Ok(())
}

/// Remove the materialized scratch tree. Idempotent: cleaning up an already
/// removed tree is not an error.
///
/// # Errors
/// Returns `ShadowFsError::Io` if removal fails for a reason other than
/// the path already being gone.
pub fn cleanup(materialized: &Materialized) -> Result<(), ShadowFsError> {
    match fs::remove_dir_all(&materialized.root) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ShadowFsError::Io(e)),
    }
}

#[must_use]
pub fn resolve_materialized_path(materialized: &Materialized, path: &RelPath) -> PathBuf {
    materialized.root.join(path.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tofs::path_canon::CaseSensitivity;

    #[test]
    fn materialize_applies_overlay_write_and_cleans_up() {
        let disk = tempfile::tempdir().unwrap();
        fs::create_dir(disk.path().join("src")).unwrap();
        fs::write(disk.path().join("src/a.rs"), b"old").unwrap();
        fs::create_dir(disk.path().join("untouched")).unwrap();
        fs::write(disk.path().join("untouched/b.rs"), b"stable").unwrap();

        let mut overlay = Overlay::new(disk.path().to_path_buf(), CaseSensitivity::sensitive());
        overlay
            .write(&RelPath::new("src/a.rs").unwrap(), b"new".to_vec())
            .unwrap();

        let materialized = prepare_for_external_tool(&overlay).unwrap();
        let content = fs::read_to_string(materialized.root.join("src/a.rs")).unwrap();
        assert_eq!(content, "new");
        assert!(materialized.root.join("untouched/b.rs").exists());

        cleanup(&materialized).unwrap();
        assert!(!materialized.root.exists());
    }

    #[test]
    #[cfg(unix)]
    fn top_level_symlink_escaping_root_falls_back_to_deep_copy() {
        let disk = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"outside").unwrap();
        std::os::unix::fs::symlink(outside.path(), disk.path().join("escapee")).unwrap();
        fs::create_dir(disk.path().join("untouched")).unwrap();
        fs::write(disk.path().join("untouched/b.rs"), b"stable").unwrap();

        let overlay = Overlay::new(disk.path().to_path_buf(), CaseSensitivity::sensitive());
        let materialized = prepare_for_external_tool(&overlay).unwrap();

        assert!(!materialized.root.join("escapee").is_symlink());
        assert!(materialized.root.join("escapee/secret.txt").exists());
        assert!(materialized.root.join("untouched").is_symlink());

        cleanup(&materialized).unwrap();
    }

    #[test]
    fn cleanup_is_idempotent() {
        let materialized = Materialized {
            root: PathBuf::from("/tmp/weft-definitely-not-real-dir-xyz"),
        };
        assert!(cleanup(&materialized).is_ok());
    }
}
