//! Coordinator error kinds (spec §4.5).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    AgentNotFound { agent: String },
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AgentNotFound { agent } => write!(
                f,
                "agent {agent} is not registered with the coordinator\nTo fix: spawn the agent before assigning it tasks or releasing its locks."
            ),
        }
    }
}

impl std::error::Error for CoordinatorError {}
