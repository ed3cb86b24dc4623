//! Transactional Overlay Filesystem (component C2, spec §4.1).
//!
//! Generalizes `backend/overlay.rs`'s disk-mount union overlay into an
//! in-memory `overlay: BTreeMap<RelPath, Vec<u8>> + tombstones:
//! BTreeSet<RelPath>` owned exclusively by one open `Transaction`.

pub mod diff;
pub mod error;
pub mod ir;
pub mod materialize;
pub mod overlay;
pub mod path_canon;
pub mod symbol_table;
pub mod transaction;

pub use diff::{compute_hunks, to_unified_diff};
pub use error::ShadowFsError;
pub use overlay::{ChangeKind, FilePatch, Overlay};
pub use path_canon::CaseSensitivity;
pub use transaction::{FileSnapshot, Transaction, TransactionStatus};
