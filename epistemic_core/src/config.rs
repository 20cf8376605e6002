//! Configuration for belief evolution.

use crate::error::{EpistemicError, Result};
use serde::{Deserialize, Serialize};

/// Bounds on the size of a product update's output.
///
/// Relation construction is O(|edges| · |events|²); an update that would
/// exceed either bound fails with `ResourceExhausted` instead of
/// truncating or exhausting memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Maximum number of worlds in the updated model (default: 1,000,000)
    pub max_worlds: usize,

    /// Maximum number of accessibility edges over all agents (default: 10,000,000)
    pub max_edges: usize,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            max_worlds: 1_000_000,
            max_edges: 10_000_000,
        }
    }
}

impl UpdateConfig {
    /// Builder: sets the world bound.
    pub fn with_max_worlds(mut self, max_worlds: usize) -> Self {
        self.max_worlds = max_worlds;
        self
    }

    /// Builder: sets the edge bound.
    pub fn with_max_edges(mut self, max_edges: usize) -> Self {
        self.max_edges = max_edges;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_worlds == 0 {
            return Err(EpistemicError::config("max_worlds must be positive"));
        }
        if self.max_edges == 0 {
            return Err(EpistemicError::config("max_edges must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(UpdateConfig::default().validate().is_ok());
        assert!(UpdateConfig::default().with_max_edges(0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: UpdateConfig = serde_json::from_str(r#"{ "max_worlds": 64 }"#).unwrap();
        assert_eq!(cfg.max_worlds, 64);
        assert_eq!(cfg.max_edges, UpdateConfig::default().max_edges);
    }
}
