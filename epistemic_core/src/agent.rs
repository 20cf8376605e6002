//! Agent identifiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Opaque identifier for an agent with its own knowledge.
///
/// Agents are shared by convention between the mapping front end, the
/// sensor subsystem and the planner; there is no registry. Cloning is
/// a reference-count bump.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(Arc<str>);

impl AgentId {
    /// Creates an agent id from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the agent name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AgentId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of agents, as used by group operators.
pub type AgentGroup = BTreeSet<AgentId>;

/// Builds a group from anything convertible to agent ids.
pub fn group<I, A>(agents: I) -> AgentGroup
where
    I: IntoIterator<Item = A>,
    A: Into<AgentId>,
{
    agents.into_iter().map(Into::into).collect()
}
