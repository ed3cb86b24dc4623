//! Soft-Lock & Conflict Manager (component C3, spec §4.2).

pub mod error;
pub mod manager;
pub mod merge3;
pub mod soft_lock;

pub use error::LockError;
pub use manager::{ProcessLocalLockStore, SoftLockManager, DEFAULT_TTL_SECONDS};
pub use merge3::{three_way_merge, MergeOutcome};
pub use soft_lock::SoftLock;

use crate::model::conflict::{Conflict, ConflictKind, Resolution};
use crate::model::types::AgentId;

/// Attempt automatic resolution of a `ConcurrentEdit` conflict via
/// three-way merge; falls back to `ManualRequired` when the sides overlap
/// or required content is missing (spec §4.2 "Resolution flow": auto-merge
/// first, surface to a human only when diff3 itself reports conflict
/// markers).
#[must_use]
pub fn resolve_conflict(conflict: &Conflict) -> Conflict {
    if conflict.kind() != ConflictKind::ConcurrentEdit {
        return conflict.with_resolution(Resolution::ManualRequired);
    }
    let (Some(base), Some(ours), Some(theirs)) = (conflict.base(), conflict.side_a(), conflict.side_b()) else {
        return conflict.with_resolution(Resolution::ManualRequired);
    };
    match three_way_merge(base, ours, theirs) {
        Ok(MergeOutcome::Clean(content)) => conflict.with_resolution(Resolution::AutoMerged { content }),
        Ok(MergeOutcome::Conflict { .. }) | Err(_) => conflict.with_resolution(Resolution::ManualRequired),
    }
}

/// Accept one side of an unresolvable conflict on behalf of `agent`,
/// without running a merge (an explicit escape hatch the coordinator uses
/// when a human picks a winner, spec §4.5).
#[must_use]
pub fn accept_resolution(conflict: &Conflict, agent: AgentId) -> Conflict {
    conflict.with_resolution(Resolution::Accepted { agent })
}
