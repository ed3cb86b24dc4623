//! One supervised agent session (spec §4.5: spawn/distribute/shutdown).

use crate::model::types::AgentId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSession {
    agent_id: AgentId,
    spawned_at_ms: u64,
    current_task: Option<String>,
}

impl AgentSession {
    #[must_use]
    pub const fn new(agent_id: AgentId, spawned_at_ms: u64) -> Self {
        Self {
            agent_id,
            spawned_at_ms,
            current_task: None,
        }
    }

    #[must_use]
    pub const fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    #[must_use]
    pub const fn spawned_at_ms(&self) -> u64 {
        self.spawned_at_ms
    }

    #[must_use]
    pub fn current_task(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    pub fn assign_task(&mut self, task_id: impl Into<String>) {
        self.current_task = Some(task_id.into());
    }

    pub fn clear_task(&mut self) {
        self.current_task = None;
    }
}
