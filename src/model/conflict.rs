//! `Conflict` data type (spec §3) — produced by the soft-lock manager
//! (C3) and consumed by the coordinator (C6).

use serde::{Deserialize, Serialize};

use super::types::{AgentId, RelPath, Sha256Hex};

/// What kind of conflict was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    ConcurrentEdit,
    HashDrift,
    LockTimeout,
}

/// A merge resolution outcome, recorded once a conflict is resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    AutoMerged { content: String },
    ManualRequired,
    Accepted { agent: AgentId },
}

/// `(id, file_path, agent_a, agent_b, base?, side_a?, side_b?, kind,
/// detected_at, resolved?, resolution?)` per spec §3.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    id: String,
    file_path: RelPath,
    agent_a: AgentId,
    agent_b: AgentId,
    base: Option<String>,
    side_a: Option<String>,
    side_b: Option<String>,
    kind: ConflictKind,
    detected_at_ms: u64,
    resolution: Option<Resolution>,
}

impl Conflict {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        file_path: RelPath,
        agent_a: AgentId,
        agent_b: AgentId,
        base: Option<String>,
        side_a: Option<String>,
        side_b: Option<String>,
        kind: ConflictKind,
        detected_at_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            file_path,
            agent_a,
            agent_b,
            base,
            side_a,
            side_b,
            kind,
            detected_at_ms,
            resolution: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn file_path(&self) -> &RelPath {
        &self.file_path
    }

    #[must_use]
    pub const fn agents(&self) -> (&AgentId, &AgentId) {
        (&self.agent_a, &self.agent_b)
    }

    #[must_use]
    pub const fn kind(&self) -> ConflictKind {
        self.kind
    }

    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    #[must_use]
    pub fn side_a(&self) -> Option<&str> {
        self.side_a.as_deref()
    }

    #[must_use]
    pub fn side_b(&self) -> Option<&str> {
        self.side_b.as_deref()
    }

    #[must_use]
    pub const fn detected_at_ms(&self) -> u64 {
        self.detected_at_ms
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    #[must_use]
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    #[must_use]
    pub fn with_resolution(&self, resolution: Resolution) -> Self {
        Self {
            resolution: Some(resolution),
            ..self.clone()
        }
    }
}

/// A content-hash pair surfaced by read-only drift detection (spec
/// §4.2): `detect_drift` never mutates the lock, it only reports whether
/// `current_hash` diverged from the hash recorded at lock-acquisition
/// time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriftReport {
    pub file_path: RelPath,
    pub original_hash: Sha256Hex,
    pub current_hash: Sha256Hex,
}

impl DriftReport {
    #[must_use]
    pub fn drifted(&self) -> bool {
        self.original_hash != self.current_hash
    }
}
