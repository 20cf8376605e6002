//! Indexed accessibility relations.
//!
//! Both Kripke models and event models carry one relation per agent. The
//! relation is stored as agent → source → target set so that membership
//! and successor queries on the evaluation hot path do not scan edges.
//! Ordered containers keep iteration deterministic; no caller depends on
//! that order for its results.

use crate::agent::AgentId;
use std::collections::{BTreeMap, BTreeSet};

/// Per-agent accessibility relation over ids of type `Id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation<Id> {
    index: BTreeMap<AgentId, BTreeMap<Id, BTreeSet<Id>>>,
    edge_count: usize,
}

impl<Id> Default for Relation<Id> {
    fn default() -> Self {
        Self {
            index: BTreeMap::new(),
            edge_count: 0,
        }
    }
}

impl<Id: Copy + Ord> Relation<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds edge (from, to) for `agent`. Returns false if already present.
    ///
    /// Endpoint validation is the owning model's job.
    pub fn insert(&mut self, agent: &AgentId, from: Id, to: Id) -> bool {
        let added = self
            .index
            .entry(agent.clone())
            .or_default()
            .entry(from)
            .or_default()
            .insert(to);
        if added {
            self.edge_count += 1;
        }
        added
    }

    /// Returns true if `to` is accessible from `from` for `agent`.
    pub fn contains(&self, agent: &AgentId, from: Id, to: Id) -> bool {
        self.index
            .get(agent)
            .and_then(|sources| sources.get(&from))
            .map_or(false, |targets| targets.contains(&to))
    }

    /// Worlds (or events) `agent` cannot distinguish from `from`.
    pub fn successors<'a>(&'a self, agent: &AgentId, from: Id) -> impl Iterator<Item = Id> + 'a {
        self.index
            .get(agent)
            .and_then(|sources| sources.get(&from))
            .into_iter()
            .flatten()
            .copied()
    }

    /// Returns true if `agent` has at least one edge.
    pub fn has_agent(&self, agent: &AgentId) -> bool {
        self.index.contains_key(agent)
    }

    /// Agents with at least one edge.
    pub fn agents(&self) -> impl Iterator<Item = &AgentId> {
        self.index.keys()
    }

    /// All edges of `agent` as (from, to) pairs.
    pub fn edges<'a>(&'a self, agent: &AgentId) -> impl Iterator<Item = (Id, Id)> + 'a {
        self.index
            .get(agent)
            .into_iter()
            .flat_map(|sources| {
                sources
                    .iter()
                    .flat_map(|(from, targets)| targets.iter().map(move |to| (*from, *to)))
            })
    }

    /// Total number of edges over all agents.
    pub fn len(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    /// Builds a new relation keeping only the edges accepted by `keep`.
    pub fn filtered<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&AgentId, Id, Id) -> bool,
    {
        let mut out = Self::new();
        for agent in self.index.keys() {
            for (from, to) in self.edges(agent) {
                if keep(agent, from, to) {
                    out.insert(agent, from, to);
                }
            }
        }
        out
    }
}
