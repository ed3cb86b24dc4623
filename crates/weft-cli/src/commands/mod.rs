//! Subcommand implementations.

pub mod locks;
pub mod run;
pub mod retrieve;
