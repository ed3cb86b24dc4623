//! `SoftLockManager` (component C3, spec §4.2).
//!
//! Grounded on `soft_lock_manager.py`'s `SoftLockManager` class:
//! - `acquire_lock` is idempotent for the same agent re-acquiring its own
//!   lock (refreshes `acquired_at`/`file_hash`, does not error).
//! - Expired locks are evicted lazily, the next time their key is touched —
//!   there is no background reaper thread.
//! - The Python original picks a Redis-backed store in production and a
//!   per-process in-memory map (a class variable, shared across instances)
//!   in tests; `ProcessLocalLockStore` here is the equivalent in-memory
//!   backend, and `SoftLockManager` is a trait so a future networked
//!   backend can be substituted without touching call sites (spec's
//!   concurrency model document calls this out as an open question,
//!   resolved in DESIGN.md in favor of a trait seam).

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::model::types::{AgentId, RelPath, Sha256Hex};

use super::error::LockError;
use super::soft_lock::SoftLock;

/// Default TTL for a newly acquired lock, in seconds (spec §6 Config
/// options: `lock_ttl_seconds`, default 300).
pub const DEFAULT_TTL_SECONDS: u64 = 300;

pub trait SoftLockManager {
    /// Acquire a lock on `path` for `agent`. Idempotent if `agent` already
    /// holds the lock (refreshes the hash and timer); otherwise fails with
    /// `LockConflict` if a different, non-expired agent holds it, unless
    /// `force` is set.
    ///
    /// # Errors
    /// Returns `LockError::LockConflict` if another agent holds a live lock
    /// and `force` is `false`.
    fn acquire_lock(
        &self,
        path: &RelPath,
        agent: &AgentId,
        file_hash: Sha256Hex,
        ttl_seconds: u64,
        now_ms: u64,
        force: bool,
    ) -> Result<SoftLock, LockError>;

    /// Release `agent`'s lock on `path`. A no-op if the lock has already
    /// expired or does not exist; errors only if `agent` does not hold the
    /// live lock.
    ///
    /// # Errors
    /// Returns `LockError::LockExpired` if the path has no live lock, or
    /// `LockError::LockConflict` if a different agent holds it.
    fn release_lock(&self, path: &RelPath, agent: &AgentId, now_ms: u64) -> Result<(), LockError>;

    /// Look up the live lock on `path`, evicting it first if expired.
    fn get_lock(&self, path: &RelPath, now_ms: u64) -> Option<SoftLock>;

    /// `true` if `path` is free, or already held by `agent`.
    fn check_lock(&self, path: &RelPath, agent: &AgentId, now_ms: u64) -> bool;

    /// Read-only drift check: compares `current_hash` against the hash
    /// recorded at acquisition time. Never mutates the lock.
    fn detect_drift(&self, path: &RelPath, current_hash: &Sha256Hex, now_ms: u64) -> bool;

    /// All live (non-expired) locks, sorted by path.
    fn list_locks(&self, now_ms: u64) -> Vec<SoftLock>;
}

/// In-memory lock store, one map per instance (the Python original shares
/// one class-variable map across instances in its test backend; here each
/// `ProcessLocalLockStore` owns its own map, and callers share one instance
/// via `Arc` when process-wide sharing is wanted).
#[derive(Default)]
pub struct ProcessLocalLockStore {
    locks: Mutex<BTreeMap<RelPath, SoftLock>>,
}

impl ProcessLocalLockStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn evict_if_expired(locks: &mut BTreeMap<RelPath, SoftLock>, path: &RelPath, now_ms: u64) {
        let expired = locks.get(path).is_some_and(|l| l.is_expired(now_ms));
        if expired {
            locks.remove(path);
        }
    }
}

impl SoftLockManager for ProcessLocalLockStore {
    fn acquire_lock(
        &self,
        path: &RelPath,
        agent: &AgentId,
        file_hash: Sha256Hex,
        ttl_seconds: u64,
        now_ms: u64,
        force: bool,
    ) -> Result<SoftLock, LockError> {
        let mut locks = self.locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Self::evict_if_expired(&mut locks, path, now_ms);

        if let Some(existing) = locks.get(path) {
            if existing.agent_id() != agent && !force {
                return Err(LockError::LockConflict {
                    path: path.as_str().to_string(),
                    held_by: existing.agent_id().as_str().to_string(),
                });
            }
        }

        let lock = SoftLock::new(path.clone(), agent.clone(), now_ms, ttl_seconds, file_hash);
        locks.insert(path.clone(), lock.clone());
        Ok(lock)
    }

    fn release_lock(&self, path: &RelPath, agent: &AgentId, now_ms: u64) -> Result<(), LockError> {
        let mut locks = self.locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Self::evict_if_expired(&mut locks, path, now_ms);

        match locks.get(path) {
            None => Err(LockError::LockExpired {
                path: path.as_str().to_string(),
            }),
            Some(existing) if existing.agent_id() == agent => {
                locks.remove(path);
                Ok(())
            }
            Some(existing) => Err(LockError::LockConflict {
                path: path.as_str().to_string(),
                held_by: existing.agent_id().as_str().to_string(),
            }),
        }
    }

    fn get_lock(&self, path: &RelPath, now_ms: u64) -> Option<SoftLock> {
        let mut locks = self.locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Self::evict_if_expired(&mut locks, path, now_ms);
        locks.get(path).cloned()
    }

    fn check_lock(&self, path: &RelPath, agent: &AgentId, now_ms: u64) -> bool {
        self.get_lock(path, now_ms)
            .is_none_or(|l| l.agent_id() == agent)
    }

    fn detect_drift(&self, path: &RelPath, current_hash: &Sha256Hex, now_ms: u64) -> bool {
        self.get_lock(path, now_ms)
            .is_some_and(|l| l.file_hash() != current_hash)
    }

    fn list_locks(&self, now_ms: u64) -> Vec<SoftLock> {
        let mut locks = self.locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let expired_paths: Vec<RelPath> = locks
            .iter()
            .filter(|(_, l)| l.is_expired(now_ms))
            .map(|(p, _)| p.clone())
            .collect();
        for path in expired_paths {
            locks.remove(&path);
        }
        locks.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    fn path(name: &str) -> RelPath {
        RelPath::new(name).unwrap()
    }

    #[test]
    fn same_agent_reacquire_is_idempotent() {
        let store = ProcessLocalLockStore::new();
        let a = agent("agent-a");
        store
            .acquire_lock(&path("f.txt"), &a, Sha256Hex::of(b"1"), 300, 0, false)
            .unwrap();
        let second = store.acquire_lock(&path("f.txt"), &a, Sha256Hex::of(b"2"), 300, 10, false);
        assert!(second.is_ok());
        assert_eq!(second.unwrap().file_hash(), &Sha256Hex::of(b"2"));
    }

    #[test]
    fn different_agent_conflicts_without_force() {
        let store = ProcessLocalLockStore::new();
        store
            .acquire_lock(&path("f.txt"), &agent("agent-a"), Sha256Hex::of(b"1"), 300, 0, false)
            .unwrap();
        let result = store.acquire_lock(&path("f.txt"), &agent("agent-b"), Sha256Hex::of(b"1"), 300, 10, false);
        assert!(matches!(result, Err(LockError::LockConflict { .. })));
    }

    #[test]
    fn force_overrides_other_agents_lock() {
        let store = ProcessLocalLockStore::new();
        store
            .acquire_lock(&path("f.txt"), &agent("agent-a"), Sha256Hex::of(b"1"), 300, 0, false)
            .unwrap();
        let result = store.acquire_lock(&path("f.txt"), &agent("agent-b"), Sha256Hex::of(b"1"), 300, 10, true);
        assert!(result.is_ok());
    }

    #[test]
    fn expired_lock_is_evicted_lazily_on_access() {
        let store = ProcessLocalLockStore::new();
        store
            .acquire_lock(&path("f.txt"), &agent("agent-a"), Sha256Hex::of(b"1"), 10, 0, false)
            .unwrap();
        assert!(store.get_lock(&path("f.txt"), 10_001).is_none());
        // After eviction, a different agent can now acquire cleanly.
        let result = store.acquire_lock(&path("f.txt"), &agent("agent-b"), Sha256Hex::of(b"1"), 10, 10_002, false);
        assert!(result.is_ok());
    }

    #[test]
    fn release_by_non_holder_fails() {
        let store = ProcessLocalLockStore::new();
        store
            .acquire_lock(&path("f.txt"), &agent("agent-a"), Sha256Hex::of(b"1"), 300, 0, false)
            .unwrap();
        let result = store.release_lock(&path("f.txt"), &agent("agent-b"), 10);
        assert!(matches!(result, Err(LockError::LockConflict { .. })));
    }

    #[test]
    fn detect_drift_true_when_hash_diverges() {
        let store = ProcessLocalLockStore::new();
        store
            .acquire_lock(&path("f.txt"), &agent("agent-a"), Sha256Hex::of(b"1"), 300, 0, false)
            .unwrap();
        assert!(store.detect_drift(&path("f.txt"), &Sha256Hex::of(b"2"), 10));
        assert!(!store.detect_drift(&path("f.txt"), &Sha256Hex::of(b"1"), 10));
    }

    #[test]
    fn list_locks_excludes_expired() {
        let store = ProcessLocalLockStore::new();
        store
            .acquire_lock(&path("a.txt"), &agent("agent-a"), Sha256Hex::of(b"1"), 10, 0, false)
            .unwrap();
        store
            .acquire_lock(&path("b.txt"), &agent("agent-a"), Sha256Hex::of(b"1"), 300, 0, false)
            .unwrap();
        let live = store.list_locks(10_001);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].file_path().as_str(), "b.txt");
    }
}
