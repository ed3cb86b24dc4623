//! Domain value types (spec §3 / component C1).
//!
//! Everything here is immutable: construction validates invariants once,
//! and every "mutation" returns a new value via a `with_*` method.

pub mod budget;
pub mod conflict;
pub mod contract;
pub mod loop_state;
pub mod patch;
pub mod types;
