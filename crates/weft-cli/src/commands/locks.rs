//! `weft locks` — inspect and manage the soft-lock store.
//!
//! The lock store backing this command is process-local (spec §4.2,
//! §9 design notes): it only reflects locks taken by commands run inside
//! this process. A long-running coordinator process (not this CLI) is the
//! intended holder of a shared lock store across a multi-agent session.

use anyhow::{bail, Result};
use clap::Subcommand;
use weft::lock::{ProcessLocalLockStore, SoftLockManager};
use weft::model::types::{AgentId, RelPath, Sha256Hex};

#[derive(Subcommand)]
pub enum LocksCommands {
    /// Acquire a lock on a path for an agent.
    Acquire {
        path: String,
        agent: String,
        #[arg(long, default_value_t = weft::lock::DEFAULT_TTL_SECONDS)]
        ttl_seconds: u64,
        #[arg(long)]
        force: bool,
    },
    /// Release an agent's lock on a path.
    Release { path: String, agent: String },
    /// List every currently-held lock.
    List,
}

pub fn run(cmd: LocksCommands) -> Result<()> {
    let store = ProcessLocalLockStore::new();
    let now_ms = now_ms();

    match cmd {
        LocksCommands::Acquire {
            path,
            agent,
            ttl_seconds,
            force,
        } => {
            let path = RelPath::new(&path)?;
            let agent = AgentId::new(&agent)?;
            match store.acquire_lock(&path, &agent, Sha256Hex::of(b""), ttl_seconds, now_ms, force) {
                Ok(lock) => println!("acquired lock on {} for {} (expires {})", path.as_str(), agent.as_str(), lock.expires_at_ms()),
                Err(e) => bail!("{e}"),
            }
        }
        LocksCommands::Release { path, agent } => {
            let path = RelPath::new(&path)?;
            let agent = AgentId::new(&agent)?;
            store.release_lock(&path, &agent, now_ms)?;
            println!("released lock on {}", path.as_str());
        }
        LocksCommands::List => {
            let locks = store.list_locks(now_ms);
            if locks.is_empty() {
                println!("no locks held");
            }
            for lock in locks {
                println!("{}\t{}\texpires {}", lock.file_path().as_str(), lock.agent_id().as_str(), lock.expires_at_ms());
            }
        }
    }
    Ok(())
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
