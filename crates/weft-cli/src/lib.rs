//! weft CLI crate — all CLI-specific modules live here.
//!
//! The binary entry point is in `main.rs`. This lib.rs exposes CLI modules
//! so that `main.rs` can use them as `crate::module`.
//!
//! The CLI is a thin front-end over the `weft` library crate: it wires
//! config loading and telemetry, then dispatches to the core's
//! `Coordinator`, `LoopRunner`, and lock manager. Per the core design, the
//! CLI itself carries none of the closed-loop logic — it only supplies the
//! capability adapters (LLM/Sandbox/HCG) the pipeline calls through.

pub mod commands;
pub mod telemetry;
