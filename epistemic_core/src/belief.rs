//! Belief states: a Kripke model plus the hypotheses currently live.

use crate::error::{EpistemicError, Result};
use crate::kripke::KripkeModel;
use crate::world::WorldId;
use std::collections::BTreeSet;

/// A (multi-)pointed Kripke model.
///
/// The designated set holds the worlds still considered live, as opposed
/// to every world the model can conceive of. Belief states are never
/// mutated: updates and announcements build a new value and leave the
/// old one usable.
#[derive(Debug, Clone, Default)]
pub struct BeliefState {
    model: KripkeModel,
    designated: BTreeSet<WorldId>,
}

impl BeliefState {
    /// Creates a belief state. Every designated id must be a model world.
    pub fn new<I>(model: KripkeModel, designated: I) -> Result<Self>
    where
        I: IntoIterator<Item = WorldId>,
    {
        let designated: BTreeSet<WorldId> = designated.into_iter().collect();
        if let Some(missing) = designated.iter().find(|id| !model.contains(**id)) {
            return Err(EpistemicError::UnknownWorld(*missing));
        }
        Ok(Self { model, designated })
    }

    /// Designates every world of the model.
    pub fn all_designated(model: KripkeModel) -> Self {
        let designated = model.world_ids().collect();
        Self { model, designated }
    }

    /// Internal constructor for results whose invariants are established
    /// by construction.
    pub(crate) fn from_parts(model: KripkeModel, designated: BTreeSet<WorldId>) -> Self {
        debug_assert!(designated.iter().all(|id| model.contains(*id)));
        Self { model, designated }
    }

    pub fn model(&self) -> &KripkeModel {
        &self.model
    }

    pub fn designated(&self) -> &BTreeSet<WorldId> {
        &self.designated
    }

    pub fn is_designated(&self, id: WorldId) -> bool {
        self.designated.contains(&id)
    }

    /// True when no hypothesis is live.
    pub fn is_empty(&self) -> bool {
        self.designated.is_empty()
    }

    /// Number of live hypotheses.
    pub fn len(&self) -> usize {
        self.designated.len()
    }
}
