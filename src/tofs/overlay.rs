//! The transactional overlay itself (spec §4.1 "Read path" / "Write path" /
//! "Listing" / "Diff generation").
//!
//! Generalizes the teacher's disk-mount overlay (upperdir/lowerdir/workdir,
//! whiteout-file scanning) into an in-memory `overlay: BTreeMap<RelPath,
//! Vec<u8>>` union over a `disk_root: PathBuf`, with a `tombstones:
//! BTreeSet<RelPath>` standing in for overlayfs's whiteout files. One
//! `Overlay` is owned by exactly one open transaction.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::types::{RelPath, Sha256Hex};

use super::error::ShadowFsError;
use super::path_canon::{resolve_within_jail, CaseSensitivity};

/// The kind of change a path underwent relative to disk, for diff generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
}

/// A single file's change, with a unified-diff-style hunk list. Hunk
/// derivation itself lives in `super::diff`; this module only decides
/// *which* paths changed and fetches old/new content for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePatch {
    pub path: RelPath,
    pub kind: ChangeKind,
    pub old_content: Option<Vec<u8>>,
    pub new_content: Option<Vec<u8>>,
}

/// In-memory union overlay backed by a disk root, scoped to one transaction.
pub struct Overlay {
    disk_root: PathBuf,
    overlay: BTreeMap<RelPath, Vec<u8>>,
    tombstones: BTreeSet<RelPath>,
    case: CaseSensitivity,
}

impl Overlay {
    #[must_use]
    pub fn new(disk_root: PathBuf, case: CaseSensitivity) -> Self {
        Self {
            disk_root,
            overlay: BTreeMap::new(),
            tombstones: BTreeSet::new(),
            case,
        }
    }

    fn disk_path(&self, path: &RelPath) -> Result<PathBuf, ShadowFsError> {
        resolve_within_jail(&self.disk_root, path.as_str())
    }

    /// Read path: overlay hit wins; tombstone means `NotFound`; otherwise
    /// fall through to disk (spec §4.1 "Read path": "overlay, then disk,
    /// then not-found").
    ///
    /// # Errors
    /// `ShadowFsError::NotFound` if tombstoned or absent from both layers;
    /// `ShadowFsError::Security`/`Io` from jail resolution or disk reads.
    pub fn read(&self, path: &RelPath) -> Result<Vec<u8>, ShadowFsError> {
        if self.tombstones.contains(path) {
            return Err(ShadowFsError::NotFound {
                path: path.as_str().to_string(),
            });
        }
        if let Some(content) = self.overlay.get(path) {
            return Ok(content.clone());
        }
        let disk_path = self.disk_path(path)?;
        if !disk_path.is_file() {
            return Err(ShadowFsError::NotFound {
                path: path.as_str().to_string(),
            });
        }
        fs::read(&disk_path).map_err(ShadowFsError::Io)
    }

    #[must_use]
    pub fn read_to_string_lossy(&self, path: &RelPath) -> Option<String> {
        self.read(path)
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write path: writes always land in the overlay, never on disk, and
    /// clear any tombstone for the path (spec §4.1 "Write path": "a write
    /// to a previously-deleted path resurrects it").
    ///
    /// # Errors
    /// Returns `ShadowFsError::Security` if the path escapes the jail.
    pub fn write(&mut self, path: &RelPath, content: Vec<u8>) -> Result<(), ShadowFsError> {
        // Resolve to validate the path stays within the jail even though the
        // write itself never touches disk.
        let _ = self.disk_path(path)?;
        self.tombstones.remove(path);
        self.overlay.insert(path.clone(), content);
        Ok(())
    }

    /// Delete path: records a tombstone and drops any overlay content,
    /// regardless of whether the path exists on disk (idempotent).
    ///
    /// # Errors
    /// Returns `ShadowFsError::Security` if the path escapes the jail.
    pub fn delete(&mut self, path: &RelPath) -> Result<(), ShadowFsError> {
        let _ = self.disk_path(path)?;
        self.overlay.remove(path);
        self.tombstones.insert(path.clone());
        Ok(())
    }

    #[must_use]
    pub fn exists(&self, path: &RelPath) -> bool {
        if self.tombstones.contains(path) {
            return false;
        }
        if self.overlay.contains_key(path) {
            return true;
        }
        self.disk_path(path)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Union listing: disk files not tombstoned, plus every overlay path,
    /// deduplicated and sorted (spec §4.1 "Listing").
    #[must_use]
    pub fn list(&self) -> Vec<RelPath> {
        let mut seen: BTreeSet<RelPath> = BTreeSet::new();
        for path in walk_disk(&self.disk_root) {
            if let Ok(rel) = RelPath::new(normalize_for_case(&path, self.case)) {
                if !self.tombstones.contains(&rel) {
                    seen.insert(rel);
                }
            }
        }
        for path in self.overlay.keys() {
            if !self.tombstones.contains(path) {
                seen.insert(path.clone());
            }
        }
        seen.into_iter().collect()
    }

    /// Diff every path touched in the overlay or tombstoned against its
    /// original disk content (spec §4.1 "Diff generation").
    #[must_use]
    pub fn diff_vs_disk(&self) -> Vec<FilePatch> {
        let mut touched: BTreeSet<RelPath> = self.overlay.keys().cloned().collect();
        touched.extend(self.tombstones.iter().cloned());

        touched
            .into_iter()
            .map(|path| {
                let old_content = self
                    .disk_path(&path)
                    .ok()
                    .filter(|p| p.is_file())
                    .and_then(|p| fs::read(p).ok());
                let new_content = if self.tombstones.contains(&path) {
                    None
                } else {
                    self.overlay.get(&path).cloned()
                };
                let kind = match (&old_content, &new_content) {
                    (None, Some(_)) => ChangeKind::Add,
                    (Some(_), None) => ChangeKind::Delete,
                    _ => ChangeKind::Modify,
                };
                FilePatch {
                    path,
                    kind,
                    old_content,
                    new_content,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn hash_of(&self, path: &RelPath) -> Option<Sha256Hex> {
        self.read(path).ok().map(|bytes| Sha256Hex::of(&bytes))
    }

    #[must_use]
    pub const fn disk_root(&self) -> &Path {
        self.disk_root.as_path()
    }

    #[must_use]
    pub fn tombstones(&self) -> &BTreeSet<RelPath> {
        &self.tombstones
    }

    #[must_use]
    pub fn overlay_entries(&self) -> &BTreeMap<RelPath, Vec<u8>> {
        &self.overlay
    }
}

fn normalize_for_case(path: &Path, case: CaseSensitivity) -> String {
    let raw = path.to_string_lossy();
    super::path_canon::normalize(&raw, case)
}

fn walk_disk(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(root) {
                    out.push(rel.to_path_buf());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rp(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    #[test]
    fn read_falls_through_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"disk content").unwrap();
        let overlay = Overlay::new(dir.path().to_path_buf(), CaseSensitivity::sensitive());
        assert_eq!(overlay.read(&rp("a.txt")).unwrap(), b"disk content");
    }

    #[test]
    fn write_shadows_disk_without_mutating_it() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"disk content").unwrap();
        let mut overlay = Overlay::new(dir.path().to_path_buf(), CaseSensitivity::sensitive());
        overlay.write(&rp("a.txt"), b"overlay content".to_vec()).unwrap();
        assert_eq!(overlay.read(&rp("a.txt")).unwrap(), b"overlay content");
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"disk content");
    }

    #[test]
    fn delete_tombstones_even_when_absent_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut overlay = Overlay::new(dir.path().to_path_buf(), CaseSensitivity::sensitive());
        overlay.delete(&rp("never-existed.txt")).unwrap();
        assert!(overlay.read(&rp("never-existed.txt")).is_err());
        assert!(!overlay.exists(&rp("never-existed.txt")));
    }

    #[test]
    fn write_after_delete_resurrects_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"disk").unwrap();
        let mut overlay = Overlay::new(dir.path().to_path_buf(), CaseSensitivity::sensitive());
        overlay.delete(&rp("a.txt")).unwrap();
        overlay.write(&rp("a.txt"), b"resurrected".to_vec()).unwrap();
        assert_eq!(overlay.read(&rp("a.txt")).unwrap(), b"resurrected");
        assert!(overlay.exists(&rp("a.txt")));
    }

    #[test]
    fn list_unions_disk_and_overlay_minus_tombstones() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"1").unwrap();
        fs::write(dir.path().join("b.txt"), b"2").unwrap();
        let mut overlay = Overlay::new(dir.path().to_path_buf(), CaseSensitivity::sensitive());
        overlay.delete(&rp("b.txt")).unwrap();
        overlay.write(&rp("c.txt"), b"3".to_vec()).unwrap();
        let listed: Vec<String> = overlay.list().iter().map(|p| p.as_str().to_string()).collect();
        assert_eq!(listed, vec!["a.txt".to_string(), "c.txt".to_string()]);
    }

    #[test]
    fn diff_vs_disk_classifies_add_modify_delete() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("modified.txt"), b"old").unwrap();
        fs::write(dir.path().join("deleted.txt"), b"gone-soon").unwrap();
        let mut overlay = Overlay::new(dir.path().to_path_buf(), CaseSensitivity::sensitive());
        overlay.write(&rp("modified.txt"), b"new".to_vec()).unwrap();
        overlay.write(&rp("added.txt"), b"brand new".to_vec()).unwrap();
        overlay.delete(&rp("deleted.txt")).unwrap();

        let mut diffs = overlay.diff_vs_disk();
        diffs.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
        assert_eq!(diffs.len(), 3);
        assert_eq!(diffs[0].kind, ChangeKind::Add);
        assert_eq!(diffs[1].kind, ChangeKind::Delete);
        assert_eq!(diffs[2].kind, ChangeKind::Modify);
    }

    #[test]
    fn hash_of_reflects_overlay_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut overlay = Overlay::new(dir.path().to_path_buf(), CaseSensitivity::sensitive());
        overlay.write(&rp("a.txt"), b"hello".to_vec()).unwrap();
        assert_eq!(overlay.hash_of(&rp("a.txt")).unwrap(), Sha256Hex::of(b"hello"));
    }
}
