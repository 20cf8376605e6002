//! Kripke models: worlds plus per-agent accessibility.

use crate::agent::AgentId;
use crate::error::{EpistemicError, Result};
use crate::relation::Relation;
use crate::world::{World, WorldId};
use std::collections::{BTreeSet, HashMap};

/// A set of worlds with one accessibility relation per agent.
///
/// Worlds live in an arena owned by the model; the relation holds ids
/// only. Every edge endpoint is guaranteed to be a world of the model.
#[derive(Debug, Clone, Default)]
pub struct KripkeModel {
    worlds: Vec<World>,
    slots: HashMap<WorldId, usize>,
    accessibility: Relation<WorldId>,
}

impl KripkeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a world. Fails if its id is already taken.
    pub fn add_world(&mut self, world: World) -> Result<()> {
        if self.slots.contains_key(&world.id) {
            return Err(EpistemicError::DuplicateWorld(world.id));
        }
        self.slots.insert(world.id, self.worlds.len());
        self.worlds.push(world);
        Ok(())
    }

    /// Adds edge (from, to) to `agent`'s relation.
    ///
    /// Both endpoints must already be worlds of the model.
    pub fn add_edge(&mut self, agent: &AgentId, from: WorldId, to: WorldId) -> Result<()> {
        self.require(from)?;
        self.require(to)?;
        self.accessibility.insert(agent, from, to);
        Ok(())
    }

    /// Makes every pair of `ids` mutually accessible for `agent`,
    /// including self-loops (an equivalence class in S5 terms).
    pub fn add_indistinguishable(&mut self, agent: &AgentId, ids: &[WorldId]) -> Result<()> {
        for id in ids {
            self.require(*id)?;
        }
        for from in ids {
            for to in ids {
                self.accessibility.insert(agent, *from, *to);
            }
        }
        Ok(())
    }

    fn require(&self, id: WorldId) -> Result<()> {
        if self.slots.contains_key(&id) {
            Ok(())
        } else {
            Err(EpistemicError::UnknownWorld(id))
        }
    }

    /// Returns true if `to` is accessible from `from` for `agent`.
    pub fn accessible(&self, agent: &AgentId, from: WorldId, to: WorldId) -> bool {
        self.accessibility.contains(agent, from, to)
    }

    pub fn world(&self, id: WorldId) -> Option<&World> {
        self.slots.get(&id).map(|slot| &self.worlds[*slot])
    }

    pub fn contains(&self, id: WorldId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn worlds(&self) -> &[World] {
        &self.worlds
    }

    pub fn world_ids(&self) -> impl Iterator<Item = WorldId> + '_ {
        self.worlds.iter().map(|w| w.id)
    }

    pub fn relation(&self) -> &Relation<WorldId> {
        &self.accessibility
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentId> {
        self.accessibility.agents()
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.accessibility.len()
    }

    /// Sub-model induced by `keep`: worlds outside it are removed together
    /// with every edge touching them. Ids are preserved.
    pub fn restricted_to(&self, keep: &BTreeSet<WorldId>) -> Self {
        let mut out = Self::new();
        for world in self.worlds.iter().filter(|w| keep.contains(&w.id)) {
            out.slots.insert(world.id, out.worlds.len());
            out.worlds.push(world.clone());
        }
        out.accessibility = self
            .accessibility
            .filtered(|_, from, to| keep.contains(&from) && keep.contains(&to));
        out
    }

    /// Same worlds, different relation. Callers guarantee endpoints exist.
    pub(crate) fn with_relation(&self, accessibility: Relation<WorldId>) -> Self {
        Self {
            worlds: self.worlds.clone(),
            slots: self.slots.clone(),
            accessibility,
        }
    }

    /// Inserts an edge whose endpoints the caller has already validated.
    pub(crate) fn insert_edge_unchecked(&mut self, agent: &AgentId, from: WorldId, to: WorldId) -> bool {
        debug_assert!(self.contains(from) && self.contains(to));
        self.accessibility.insert(agent, from, to)
    }
}
