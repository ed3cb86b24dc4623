use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use weft_cli::commands::{locks, retrieve, run};
use weft_cli::telemetry;

/// Closed-loop patch pipeline and multi-agent coordination CLI.
///
/// weft drives a generate/validate/converge loop over a transactional
/// overlay filesystem, guarded by a soft-lock and conflict manager, and
/// backed by a hybrid retrieval pipeline for scoping edits.
#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the patch pipeline loop for a single task.
    Run {
        task_id: String,
        description: String,
        #[arg(long, default_value = ".")]
        repo_root: PathBuf,
    },

    /// Inspect and manage the soft-lock store.
    #[command(subcommand)]
    Locks(locks::LocksCommands),

    /// Run the hybrid retrieval pipeline over a directory.
    Retrieve {
        query: String,
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() -> Result<()> {
    let _telemetry_guard = telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            task_id,
            description,
            repo_root,
        } => run::run(run::RunArgs {
            task_id,
            description,
            repo_root,
        }),
        Commands::Locks(cmd) => locks::run(cmd),
        Commands::Retrieve { query, root } => retrieve::run(retrieve::RetrieveArgs { query, root }),
    }
}
