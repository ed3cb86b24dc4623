//! `TransactionState` lifecycle: Begin/Commit/Rollback, file snapshots for
//! external-drift detection, and ownership of one `Overlay` + `IrCache`
//! (spec §3 `TransactionState`, §4.1 "Transaction lifecycle").

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::model::types::{RelPath, Sha256Hex};

use super::error::ShadowFsError;
use super::ir::{IrCache, IrParseLimits};
use super::overlay::Overlay;
use super::path_canon::CaseSensitivity;
use super::symbol_table::SymbolTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Open,
    Committed,
    RolledBack,
}

/// Content-hash snapshot of a path at `begin()` time, used to detect
/// external drift on `commit()` (spec §8 scenario 3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSnapshot {
    pub path: RelPath,
    pub hash_at_begin: Sha256Hex,
}

pub struct Transaction {
    txn_id: Uuid,
    status: TransactionStatus,
    overlay: Overlay,
    ir_cache: IrCache,
    symbol_table: SymbolTable,
    snapshots: BTreeMap<RelPath, FileSnapshot>,
}

impl Transaction {
    /// Begin a transaction over `disk_root`. Snapshots the hash of every
    /// path named in `watch_paths` at open time — callers typically pass
    /// the set of paths they expect to read or write during the
    /// transaction's lifetime, since snapshotting the entire tree up front
    /// would be unbounded.
    #[must_use]
    pub fn begin(
        disk_root: std::path::PathBuf,
        case: CaseSensitivity,
        watch_paths: &[RelPath],
    ) -> Self {
        let overlay = Overlay::new(disk_root, case);
        let mut snapshots = BTreeMap::new();
        for path in watch_paths {
            if let Some(hash) = overlay.hash_of(path) {
                snapshots.insert(
                    path.clone(),
                    FileSnapshot {
                        path: path.clone(),
                        hash_at_begin: hash,
                    },
                );
            }
        }
        Self {
            txn_id: Uuid::new_v4(),
            status: TransactionStatus::Open,
            overlay,
            ir_cache: IrCache::new(IrParseLimits::default()),
            symbol_table: SymbolTable::new(),
            snapshots,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.txn_id
    }

    #[must_use]
    pub const fn status(&self) -> TransactionStatus {
        self.status
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, TransactionStatus::Open)
    }

    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut Overlay {
        &mut self.overlay
    }

    pub fn ir_cache_mut(&mut self) -> &mut IrCache {
        &mut self.ir_cache
    }

    pub fn symbol_table_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbol_table
    }

    /// Re-check every snapshotted path's hash against its current disk
    /// value (not the overlay — the overlay is the transaction's own
    /// writes, which are expected to differ). Returns the paths that
    /// drifted.
    #[must_use]
    pub fn detect_external_drift(&self) -> Vec<RelPath> {
        let mut drifted = Vec::new();
        for (path, snapshot) in &self.snapshots {
            let on_disk = self
                .overlay
                .disk_root()
                .join(path.as_str());
            let Ok(bytes) = std::fs::read(&on_disk) else {
                continue;
            };
            let current_hash = Sha256Hex::of(&bytes);
            if current_hash != snapshot.hash_at_begin {
                drifted.push(path.clone());
            }
        }
        drifted
    }

    /// Commit the transaction: re-checks for external drift first (spec §8
    /// scenario 3, "commit must fail with `ExternalDrift`"), and on success
    /// disposes the IR cache and symbol table per the "unreachable after
    /// commit" invariant.
    ///
    /// # Errors
    /// Returns `ShadowFsError::ExternalDrift` if any watched path changed
    /// on disk since `begin()`.
    pub fn commit(mut self) -> Result<Overlay, ShadowFsError> {
        if let Some(path) = self.detect_external_drift().into_iter().next() {
            return Err(ShadowFsError::ExternalDrift {
                path: path.as_str().to_string(),
            });
        }
        self.status = TransactionStatus::Committed;
        self.ir_cache.dispose();
        Ok(self.overlay)
    }

    /// Roll back: all overlay writes and tombstones are discarded, and the
    /// IR cache and symbol table become unreachable. This never fails.
    pub fn rollback(mut self) {
        self.status = TransactionStatus::RolledBack;
        self.ir_cache.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_snapshots_watched_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"v1").unwrap();
        let path = RelPath::new("a.txt").unwrap();
        let txn = Transaction::begin(dir.path().to_path_buf(), CaseSensitivity::sensitive(), &[path.clone()]);
        assert!(txn.detect_external_drift().is_empty());
    }

    #[test]
    fn commit_fails_on_external_drift() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"v1").unwrap();
        let path = RelPath::new("a.txt").unwrap();
        let txn = Transaction::begin(dir.path().to_path_buf(), CaseSensitivity::sensitive(), &[path]);

        // Simulate an external process mutating the file mid-transaction.
        std::fs::write(dir.path().join("a.txt"), b"v2-from-elsewhere").unwrap();

        let result = txn.commit();
        assert!(matches!(result, Err(ShadowFsError::ExternalDrift { .. })));
    }

    #[test]
    fn commit_without_drift_returns_overlay() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"v1").unwrap();
        let path = RelPath::new("a.txt").unwrap();
        let mut txn = Transaction::begin(dir.path().to_path_buf(), CaseSensitivity::sensitive(), &[path.clone()]);
        txn.overlay_mut().write(&path, b"v2-from-overlay".to_vec()).unwrap();
        let overlay = txn.commit().unwrap();
        assert_eq!(overlay.read(&path).unwrap(), b"v2-from-overlay");
    }

    #[test]
    fn rollback_never_fails() {
        let dir = tempfile::tempdir().unwrap();
        let txn = Transaction::begin(dir.path().to_path_buf(), CaseSensitivity::sensitive(), &[]);
        txn.rollback();
    }

    #[test]
    fn each_transaction_gets_a_unique_id() {
        let dir = tempfile::tempdir().unwrap();
        let a = Transaction::begin(dir.path().to_path_buf(), CaseSensitivity::sensitive(), &[]);
        let b = Transaction::begin(dir.path().to_path_buf(), CaseSensitivity::sensitive(), &[]);
        assert_ne!(a.id(), b.id());
    }
}
