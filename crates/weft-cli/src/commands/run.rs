//! `weft run` — drive the patch pipeline loop for a single task.
//!
//! The LLM/Sandbox/HCG capabilities are external collaborators reached
//! through narrow interfaces (spec §1, §6); this CLI does not ship adapters
//! for them. `weft run` is wired against `weft::pipeline::LoopRunner` and
//! will drive any process that supplies concrete `LlmPort`/`SandboxPort`/
//! `HcgPort` implementations — today that means embedding this crate as a
//! library, not invoking the CLI binary directly.

use anyhow::{bail, Result};
use std::path::PathBuf;

pub struct RunArgs {
    pub task_id: String,
    pub description: String,
    pub repo_root: PathBuf,
}

pub fn run(args: RunArgs) -> Result<()> {
    bail!(
        "weft run {} ({}) at {}: no LLM/Sandbox/HCG adapters are registered.\n\
         To fix: embed weft-cli as a library and call `weft::pipeline::LoopRunner::run` \
         with concrete capability adapters, or wait for a built-in adapter to ship.",
        args.task_id,
        args.description,
        args.repo_root.display(),
    );
}
