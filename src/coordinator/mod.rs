//! Multi-Agent Coordinator (component C6, spec §4.5): supervises concurrent
//! agent sessions, distributes tasks round-robin, and arbitrates conflicts
//! detected across sessions' declared path interest — grounded on the
//! lock-then-pipeline session shape spec §2's top-level control flow
//! describes ("a session begins a TOFS transaction, obtains soft-locks on
//! target paths, then executes the Patch Pipeline").

pub mod error;
pub mod session;

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::lock::{resolve_conflict, SoftLockManager};
use crate::model::conflict::{Conflict, ConflictKind};
use crate::model::types::{AgentId, RelPath};

pub use error::CoordinatorError;
pub use session::AgentSession;

/// Supervises agent sessions against a shared lock store. Generic over the
/// lock-manager backend so tests can substitute a fake without touching
/// coordination logic (same seam `SoftLockManager` already provides).
pub struct Coordinator<L: SoftLockManager> {
    lock_store: Arc<L>,
    sessions: Mutex<BTreeMap<AgentId, AgentSession>>,
    spawn_order: Mutex<Vec<AgentId>>,
    round_robin_cursor: Mutex<usize>,
    task_queue: Mutex<VecDeque<String>>,
    /// Paths each agent has declared it intends to touch this session,
    /// independent of whether its `acquire_lock` call actually won the
    /// lock — this is what `detect_conflicts` groups by path, since the
    /// lock store itself only ever retains one live holder per path.
    touches: Mutex<BTreeMap<RelPath, BTreeSet<AgentId>>>,
}

impl<L: SoftLockManager> Coordinator<L> {
    #[must_use]
    pub fn new(lock_store: Arc<L>) -> Self {
        Self {
            lock_store,
            sessions: Mutex::new(BTreeMap::new()),
            spawn_order: Mutex::new(Vec::new()),
            round_robin_cursor: Mutex::new(0),
            task_queue: Mutex::new(VecDeque::new()),
            touches: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock_store(&self) -> &L {
        self.lock_store.as_ref()
    }

    /// Register a new agent session.
    pub fn spawn_agent(&self, agent_id: AgentId, now_ms: u64) {
        let mut sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if sessions.contains_key(&agent_id) {
            return;
        }
        self.spawn_order
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(agent_id.clone());
        sessions.insert(agent_id.clone(), AgentSession::new(agent_id, now_ms));
    }

    /// Shut down an agent: releases every lock it still holds and forgets
    /// its session and declared touches (spec §4.5 "shutdown releases every
    /// lock the agent still holds").
    ///
    /// # Errors
    /// Returns `CoordinatorError::AgentNotFound` if `agent_id` was never
    /// spawned (or was already shut down).
    pub fn shutdown_agent(&self, agent_id: &AgentId, now_ms: u64) -> Result<(), CoordinatorError> {
        {
            let mut sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if sessions.remove(agent_id).is_none() {
                return Err(CoordinatorError::AgentNotFound {
                    agent: agent_id.as_str().to_string(),
                });
            }
        }
        self.spawn_order
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|a| a != agent_id);

        let held: Vec<RelPath> = self
            .lock_store()
            .list_locks(now_ms)
            .into_iter()
            .filter(|l| l.agent_id() == agent_id)
            .map(|l| l.file_path().clone())
            .collect();
        for path in held {
            let _ = self.lock_store().release_lock(&path, agent_id, now_ms);
        }

        let mut touches = self.touches.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        touches.retain(|_, holders| {
            holders.remove(agent_id);
            !holders.is_empty()
        });
        Ok(())
    }

    /// Queue a task for round-robin distribution.
    pub fn enqueue_task(&self, task_id: impl Into<String>) {
        self.task_queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(task_id.into());
    }

    /// Hand out as many queued tasks as possible, one per active agent per
    /// pass, cycling through agents in spawn order (spec §4.5 "distribute
    /// tasks round-robin").
    #[must_use]
    pub fn distribute_tasks(&self) -> Vec<(AgentId, String)> {
        let order = self.spawn_order.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if order.is_empty() {
            return Vec::new();
        }
        let mut cursor = self.round_robin_cursor.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut queue = self.task_queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut assignments = Vec::new();
        while let Some(task) = queue.pop_front() {
            let agent = order[*cursor % order.len()].clone();
            *cursor += 1;
            if let Some(session) = sessions.get_mut(&agent) {
                session.assign_task(task.clone());
            }
            assignments.push((agent, task));
        }
        assignments
    }

    /// Record that `agent` intends to touch `path` this session — call
    /// this from Step 1/2 (scope/safety) before acquiring locks, so
    /// `detect_conflicts` can see contention even when the lock store only
    /// shows the winning holder.
    pub fn record_touch(&self, agent: &AgentId, path: RelPath) {
        self.touches
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(path)
            .or_default()
            .insert(agent.clone());
    }

    /// Group declared touches by path; any path with ≥ 2 distinct agents is
    /// a concurrent-edit conflict, recording the first two holders (spec
    /// §4.5 "Detect conflicts").
    #[must_use]
    pub fn detect_conflicts(&self, now_ms: u64) -> Vec<Conflict> {
        let touches = self.touches.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut conflicts = Vec::new();
        for (path, holders) in touches.iter() {
            if holders.len() < 2 {
                continue;
            }
            let mut it = holders.iter();
            let Some(a) = it.next() else { continue };
            let Some(b) = it.next() else { continue };
            conflicts.push(Conflict::new(
                format!("conflict-{}-{now_ms}", path.as_str()),
                path.clone(),
                a.clone(),
                b.clone(),
                None,
                None,
                None,
                ConflictKind::ConcurrentEdit,
                now_ms,
            ));
        }
        conflicts
    }

    /// Attempt auto-resolution of each conflict via C3's three-way merge,
    /// falling back to `ManualRequired` (spec §4.5 "Resolve"). Conflicts
    /// without `base`/`side_a`/`side_b` populated (the common case straight
    /// out of `detect_conflicts`) always resolve to `ManualRequired` — callers
    /// that can supply file content should reconstruct the `Conflict` with
    /// the three sides filled in first.
    #[must_use]
    pub fn resolve_conflicts(&self, conflicts: &[Conflict]) -> Vec<Conflict> {
        conflicts.iter().map(resolve_conflict).collect()
    }

    #[must_use]
    pub fn active_agents(&self) -> Vec<AgentId> {
        self.spawn_order.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::ProcessLocalLockStore;
    use crate::model::types::Sha256Hex;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    fn path(name: &str) -> RelPath {
        RelPath::new(name).unwrap()
    }

    #[test]
    fn round_robin_distributes_across_spawned_agents() {
        let coordinator = Coordinator::new(Arc::new(ProcessLocalLockStore::new()));
        coordinator.spawn_agent(agent("a"), 0);
        coordinator.spawn_agent(agent("b"), 0);
        coordinator.enqueue_task("t1");
        coordinator.enqueue_task("t2");
        coordinator.enqueue_task("t3");
        let assignments = coordinator.distribute_tasks();
        assert_eq!(
            assignments,
            vec![
                (agent("a"), "t1".to_string()),
                (agent("b"), "t2".to_string()),
                (agent("a"), "t3".to_string()),
            ]
        );
    }

    #[test]
    fn shutdown_releases_held_locks() {
        let store = Arc::new(ProcessLocalLockStore::new());
        let coordinator = Coordinator::new(store.clone());
        coordinator.spawn_agent(agent("a"), 0);
        store
            .acquire_lock(&path("f.txt"), &agent("a"), Sha256Hex::of(b"1"), 300, 0, false)
            .unwrap();
        coordinator.shutdown_agent(&agent("a"), 10).unwrap();
        assert!(store.get_lock(&path("f.txt"), 10).is_none());
    }

    #[test]
    fn shutdown_unknown_agent_fails() {
        let coordinator = Coordinator::new(Arc::new(ProcessLocalLockStore::new()));
        assert!(coordinator.shutdown_agent(&agent("ghost"), 0).is_err());
    }

    #[test]
    fn detect_conflicts_groups_by_path_with_two_or_more_holders() {
        let coordinator = Coordinator::new(Arc::new(ProcessLocalLockStore::new()));
        coordinator.record_touch(&agent("a"), path("shared.rs"));
        coordinator.record_touch(&agent("b"), path("shared.rs"));
        coordinator.record_touch(&agent("a"), path("only_a.rs"));
        let conflicts = coordinator.detect_conflicts(5);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].file_path().as_str(), "shared.rs");
        assert_eq!(conflicts[0].kind(), ConflictKind::ConcurrentEdit);
    }

    #[test]
    fn resolve_conflicts_without_sides_requires_manual() {
        let coordinator = Coordinator::new(Arc::new(ProcessLocalLockStore::new()));
        coordinator.record_touch(&agent("a"), path("shared.rs"));
        coordinator.record_touch(&agent("b"), path("shared.rs"));
        let conflicts = coordinator.detect_conflicts(5);
        let resolved = coordinator.resolve_conflicts(&conflicts);
        assert_eq!(
            resolved[0].resolution(),
            Some(&crate::model::conflict::Resolution::ManualRequired)
        );
    }
}
