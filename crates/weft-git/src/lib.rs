//! Git abstraction layer for weft.
//!
//! This crate defines the [`GitRepo`] trait — the single interface through
//! which other weft crates interact with git. No other weft crate should
//! import gix (or any other git library) directly; instead, they depend on
//! `weft-git` and program against the trait.
//!
//! # Crate layout
//!
//! - [`repo`] — the [`GitRepo`] trait definition.
//! - [`types`] — value types used in trait signatures ([`GitOid`], [`RefName`],
//!   [`TreeEntry`], [`DiffEntry`], etc.).
//! - [`error`] — the [`GitError`] enum returned by all trait methods.
//! - [`gix_repo`] — [`GixRepo`], the only [`GitRepo`] implementation, backed
//!   by `gix`. Its method bodies live split across the `*_impl` modules
//!   below, one per capability area.

pub mod error;
pub mod gix_repo;
pub mod repo;
pub mod types;

mod checkout_impl;
mod config_impl;
mod diff_impl;
mod index_impl;
mod objects_impl;
mod push_impl;
mod refs_impl;
mod stash_impl;
mod status_impl;
mod worktree_impl;

// Re-export the main trait and commonly used types at the crate root for
// ergonomic imports: `use weft_git::{GitRepo, GitOid, GitError};`
pub use error::GitError;
pub use gix_repo::GixRepo;
pub use repo::GitRepo;
pub use types::{
    ChangeType, CommitInfo, DiffEntry, EntryMode, FileStatus, GitOid, IndexEntry, OidParseError,
    RefEdit, RefName, RefNameError, StatusEntry, TreeEdit, TreeEntry, WorktreeInfo,
};
