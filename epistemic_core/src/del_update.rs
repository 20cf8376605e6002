//! DEL product update: `(BeliefState, EventModel) → BeliefState`.
//!
//! 1. **Worlds**: every designated world w paired with every event e whose
//!    precondition holds at w becomes a new world `pair(w, e)`. A
//!    designated world with no possible event is dropped: the evidence
//!    rules that hypothesis out.
//! 2. **Accessibility**: for agent a, `(w1,e1) → (w2,e2)` iff `w1 → w2` in
//!    the input model, `e1 → e2` in the event model, and both pairs
//!    survived phase 1.
//!
//! New ids come from Cantor pairing of (world id, event id). The pairing
//! is computed per pair with no shared counter, so ids do not depend on
//! iteration order.

use crate::atoms::{AtomInterpreter, GridInterpreter};
use crate::belief::BeliefState;
use crate::config::UpdateConfig;
use crate::error::{EpistemicError, Result};
use crate::event_model::{Event, EventId, EventModel};
use crate::kripke::KripkeModel;
use crate::query::Evaluator;
use crate::world::{World, WorldId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace, warn};

/// Cantor pairing of a world id and an event id.
///
/// Injective over all (u64, u64); fails with `PairingOverflow` when the
/// result does not fit a `u64`.
pub fn pair_ids(world: WorldId, event: EventId) -> Result<WorldId> {
    let overflow = || EpistemicError::PairingOverflow { world, event };
    let (a, b) = (world.0 as u128, event.0 as u128);
    let s = a + b;
    let paired = s
        .checked_mul(s + 1)
        .map(|t| t / 2 + b)
        .ok_or_else(overflow)?;
    u64::try_from(paired).map(WorldId).map_err(|_| overflow())
}

/// Inverse of `pair_ids`: recovers the (parent world, event) lineage.
pub fn unpair_id(id: WorldId) -> (WorldId, EventId) {
    let z = id.0 as u128;
    let triangle = |n: u128| n * (n + 1) / 2;

    // float estimate, then exact correction
    let mut w = (((8.0 * z as f64 + 1.0).sqrt() - 1.0) / 2.0) as u128;
    while triangle(w) > z {
        w -= 1;
    }
    while triangle(w + 1) <= z {
        w += 1;
    }
    let b = z - triangle(w);
    let a = w - b;
    (WorldId(a as u64), EventId(b as u64))
}

/// Builds the payload of a world created by product update.
///
/// This is the extension point for event effects (e.g. an event that
/// moves an agent). The returned world must carry `id`; any other id fails
/// the update with `MislabeledWorld`.
pub trait PayloadTransform {
    fn transform(&self, parent: &World, event: &Event, id: WorldId) -> World;
}

/// Copies the parent's payload verbatim; events only filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyPayload;

impl PayloadTransform for CopyPayload {
    fn transform(&self, parent: &World, _event: &Event, id: WorldId) -> World {
        parent.relabeled(id)
    }
}

/// Summary of one update, for logging and harness metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub worlds_in: usize,
    pub worlds_out: usize,
    pub edges_in: usize,
    pub edges_out: usize,
    pub hypotheses_dropped: usize,
}

/// Configurable product update.
pub struct ProductUpdate<I = GridInterpreter, T = CopyPayload> {
    interpreter: I,
    transform: T,
    config: UpdateConfig,
}

impl ProductUpdate {
    /// Product update with grid predicates and copied payloads.
    pub fn new() -> Self {
        Self {
            interpreter: GridInterpreter,
            transform: CopyPayload,
            config: UpdateConfig::default(),
        }
    }
}

impl Default for ProductUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: AtomInterpreter, T: PayloadTransform> ProductUpdate<I, T> {
    /// Replaces the domain binding used to check preconditions.
    pub fn with_interpreter<J: AtomInterpreter>(self, interpreter: J) -> ProductUpdate<J, T> {
        ProductUpdate {
            interpreter,
            transform: self.transform,
            config: self.config,
        }
    }

    /// Replaces the payload transform.
    pub fn with_transform<U: PayloadTransform>(self, transform: U) -> ProductUpdate<I, U> {
        ProductUpdate {
            interpreter: self.interpreter,
            transform,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: UpdateConfig) -> Self {
        self.config = config;
        self
    }

    /// Applies the update, returning the new belief state.
    pub fn apply(&self, belief: &BeliefState, events: &EventModel) -> Result<BeliefState> {
        self.apply_with_stats(belief, events).map(|(updated, _)| updated)
    }

    /// Applies the update and reports sizes.
    pub fn apply_with_stats(
        &self,
        belief: &BeliefState,
        events: &EventModel,
    ) -> Result<(BeliefState, UpdateStats)> {
        self.config.validate()?;
        let eval = Evaluator::with_interpreter(belief, &self.interpreter);

        // Phase 1: worlds
        let mut model = KripkeModel::new();
        let mut designated = BTreeSet::new();
        let mut lineage: HashMap<WorldId, (WorldId, EventId)> = HashMap::new();
        let mut possible: BTreeMap<WorldId, BTreeSet<EventId>> = BTreeMap::new();
        let mut dropped = 0;

        for &w in belief.designated() {
            let parent = belief
                .model()
                .world(w)
                .ok_or(EpistemicError::UnknownWorld(w))?;
            let mut here = BTreeSet::new();

            for event in events.events() {
                if !eval.holds(w, &event.precondition) {
                    continue;
                }
                let id = pair_ids(w, event.id)?;
                record_lineage(&mut lineage, id, w, event.id)?;
                if model.len() >= self.config.max_worlds {
                    return Err(EpistemicError::exhausted("worlds", self.config.max_worlds));
                }
                let world = self.transform.transform(parent, event, id);
                if world.id != id {
                    return Err(EpistemicError::MislabeledWorld {
                        expected: id,
                        actual: world.id,
                    });
                }
                model.add_world(world)?;
                designated.insert(id);
                here.insert(event.id);
            }

            if here.is_empty() {
                trace!("hypothesis {} ruled out by evidence", w);
                dropped += 1;
            } else {
                possible.insert(w, here);
            }
        }

        // Phase 2: accessibility
        let relation = belief.model().relation();
        for agent in relation.agents() {
            for (w1, w2) in relation.edges(agent) {
                let (Some(from_events), Some(to_events)) = (possible.get(&w1), possible.get(&w2)) else {
                    continue;
                };
                for &e1 in from_events {
                    for e2 in events.relation().successors(agent, e1) {
                        if !to_events.contains(&e2) {
                            continue;
                        }
                        let from = pair_ids(w1, e1)?;
                        let to = pair_ids(w2, e2)?;
                        if model.insert_edge_unchecked(agent, from, to)
                            && model.edge_count() > self.config.max_edges
                        {
                            return Err(EpistemicError::exhausted("edges", self.config.max_edges));
                        }
                    }
                }
            }
        }

        let stats = UpdateStats {
            worlds_in: belief.len(),
            worlds_out: designated.len(),
            edges_in: belief.model().edge_count(),
            edges_out: model.edge_count(),
            hypotheses_dropped: dropped,
        };
        debug!(
            "product update: {} events, worlds {} -> {}, edges {} -> {}",
            events.len(),
            stats.worlds_in,
            stats.worlds_out,
            stats.edges_in,
            stats.edges_out
        );
        if designated.is_empty() && !belief.is_empty() {
            warn!("product update eliminated every hypothesis ({} dropped)", dropped);
        }

        Ok((BeliefState::from_parts(model, designated), stats))
    }
}

/// Remembers which (world, event) pair minted `id`; a second pair minting
/// the same id is an `IdCollision` naming both.
fn record_lineage(
    lineage: &mut HashMap<WorldId, (WorldId, EventId)>,
    id: WorldId,
    world: WorldId,
    event: EventId,
) -> Result<()> {
    match lineage.insert(id, (world, event)) {
        Some((other_world, other_event)) => Err(EpistemicError::IdCollision {
            world,
            event,
            other_world,
            other_event,
            id,
        }),
        None => Ok(()),
    }
}

/// Product update with grid predicates, copied payloads and default bounds.
pub fn product_update(belief: &BeliefState, events: &EventModel) -> Result<BeliefState> {
    ProductUpdate::new().apply(belief, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{group, AgentId};
    use crate::formula::Formula;
    use crate::query::{group_reachable, holds, holds_in_all};
    use crate::world::{CellState, GridMap};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn a() -> AgentId {
        AgentId::new("a")
    }

    fn b() -> AgentId {
        AgentId::new("b")
    }

    /// n worlds; world i has cell (0,0) free iff i is even.
    fn belief(n: u64) -> BeliefState {
        let free = Arc::new(GridMap::filled(1, 1, 1.0, CellState::Free));
        let wall = Arc::new(GridMap::filled(1, 1, 1.0, CellState::Occupied));
        let mut model = KripkeModel::new();
        for i in 0..n {
            let map = if i % 2 == 0 { free.clone() } else { wall.clone() };
            model.add_world(World::new(WorldId(i), map)).unwrap();
        }
        let all: Vec<WorldId> = (0..n).map(WorldId).collect();
        model.add_indistinguishable(&a(), &all).unwrap();
        model.add_indistinguishable(&b(), &all[..(n as usize).min(2)]).unwrap();
        BeliefState::all_designated(model)
    }

    /// a observes whether (0,0) is free; b cannot tell the events apart.
    fn sense_cell() -> EventModel {
        let p = Formula::atom("cell_free(0,0)");
        let mut em = EventModel::new();
        em.add_event(Event::new(EventId(0), p.clone())).unwrap();
        em.add_event(Event::new(EventId(1), Formula::not(p))).unwrap();
        for e in [0, 1] {
            em.add_edge(&a(), EventId(e), EventId(e)).unwrap();
            for f in [0, 1] {
                em.add_edge(&b(), EventId(e), EventId(f)).unwrap();
            }
        }
        em
    }

    #[test]
    fn test_pairing_roundtrip_and_injectivity() {
        let mut seen = std::collections::HashSet::new();
        for w in 0..40u64 {
            for e in 0..40u64 {
                let id = pair_ids(WorldId(w), EventId(e)).unwrap();
                assert!(seen.insert(id), "collision at ({w},{e})");
                assert_eq!(unpair_id(id), (WorldId(w), EventId(e)));
            }
        }
        let big = pair_ids(WorldId(3_000_000_000), EventId(17)).unwrap();
        assert_eq!(unpair_id(big), (WorldId(3_000_000_000), EventId(17)));
    }

    #[test]
    fn test_pairing_overflow_fails() {
        let err = pair_ids(WorldId(u64::MAX), EventId(1)).unwrap_err();
        assert_eq!(
            err,
            EpistemicError::PairingOverflow {
                world: WorldId(u64::MAX),
                event: EventId(1)
            }
        );
    }

    #[test]
    fn test_private_sensing_gives_knowledge_to_observer_only() {
        let before = belief(2);
        let p = Formula::atom("cell_free(0,0)");
        assert!(!holds(&before, WorldId(0), &Formula::knows(a(), p.clone())));

        let after = product_update(&before, &sense_cell()).unwrap();
        assert_eq!(after.len(), 2);

        let actual = pair_ids(WorldId(0), EventId(0)).unwrap();
        assert!(holds(&after, actual, &Formula::knows(a(), p.clone())));
        assert!(!holds(&after, actual, &Formula::knows(b(), p.clone())));
        // b knows that a knows whether p
        let a_knows_whether = Formula::or(
            Formula::knows(a(), p.clone()),
            Formula::knows(a(), Formula::not(p)),
        );
        assert!(holds(&after, actual, &Formula::knows(b(), a_knows_whether)));
    }

    #[test]
    fn test_unsatisfied_hypotheses_are_dropped() {
        let before = belief(4);
        let mut em = EventModel::new();
        em.add_event(Event::new(EventId(0), Formula::atom("cell_free(0,0)"))).unwrap();
        em.add_edge(&a(), EventId(0), EventId(0)).unwrap();

        let (after, stats) = ProductUpdate::new().apply_with_stats(&before, &em).unwrap();
        assert_eq!(stats.hypotheses_dropped, 2);
        assert_eq!(after.len(), 2);
        assert!(holds_in_all(&after, &Formula::atom("cell_free(0,0)")));
        // even worlds 0 and 2 stay mutually accessible for a
        let w0 = pair_ids(WorldId(0), EventId(0)).unwrap();
        let w2 = pair_ids(WorldId(2), EventId(0)).unwrap();
        assert!(after.model().accessible(&a(), w0, w2));
        // b had no event edges, so b's relation is gone
        assert!(!after.model().relation().has_agent(&b()));
    }

    #[test]
    fn test_identity_event_preserves_structure() {
        let before = belief(3);
        let agents: Vec<AgentId> = before.model().agents().cloned().collect();
        let after = product_update(&before, &EventModel::trivial(agents.iter())).unwrap();

        assert_eq!(after.len(), before.len());
        assert_eq!(after.model().len(), before.model().len());
        assert_eq!(after.model().edge_count(), before.model().edge_count());

        let g = group(["a", "b"]);
        for w in before.designated() {
            let image = pair_ids(*w, EventId(0)).unwrap();
            let reach_before = group_reachable(before.model(), *w, &g).len();
            let reach_after = group_reachable(after.model(), image, &g).len();
            assert_eq!(reach_before, reach_after);
        }
    }

    #[test]
    fn test_empty_event_model_empties_belief() {
        let after = product_update(&belief(3), &EventModel::new()).unwrap();
        assert!(after.is_empty());
        assert!(after.model().is_empty());
    }

    #[test]
    fn test_input_belief_is_untouched() {
        let before = belief(2);
        let _ = product_update(&before, &sense_cell()).unwrap();
        assert_eq!(before.len(), 2);
        assert!(before.is_designated(WorldId(1)));
    }

    #[test]
    fn test_world_bound_fails_fast() {
        let update = ProductUpdate::new().with_config(UpdateConfig::default().with_max_worlds(1));
        let err = update.apply(&belief(4), &sense_cell()).unwrap_err();
        assert_eq!(err, EpistemicError::exhausted("worlds", 1));
    }

    #[test]
    fn test_edge_bound_fails_fast() {
        let update = ProductUpdate::new().with_config(UpdateConfig::default().with_max_edges(3));
        let err = update.apply(&belief(4), &sense_cell()).unwrap_err();
        assert_eq!(err, EpistemicError::exhausted("edges", 3));
    }

    #[test]
    fn test_custom_transform_and_interpreter() {
        struct Tag;
        impl PayloadTransform for Tag {
            fn transform(&self, parent: &World, event: &Event, id: WorldId) -> World {
                parent.relabeled(id).with_goal("a", format!("after_{}", event.id))
            }
        }

        let everything = |_: &World, _: &str| true;
        let update = ProductUpdate::new()
            .with_interpreter(everything)
            .with_transform(Tag);

        let after = update.apply(&belief(2), &sense_cell()).unwrap();
        // every precondition is satisfied under the permissive interpreter,
        // except the negated one
        assert_eq!(after.len(), 2);
        for w in after.model().worlds() {
            assert_eq!(w.goals[&a()], "after_e0");
        }
    }

    #[test]
    fn test_mislabeling_transform_fails_fast() {
        struct Shifted;
        impl PayloadTransform for Shifted {
            fn transform(&self, parent: &World, _event: &Event, id: WorldId) -> World {
                parent.relabeled(WorldId(id.0 + 1000))
            }
        }

        let before = belief(2);
        let agents: Vec<AgentId> = before.model().agents().cloned().collect();
        let err = ProductUpdate::new()
            .with_transform(Shifted)
            .apply(&before, &EventModel::trivial(agents.iter()))
            .unwrap_err();

        let expected = pair_ids(WorldId(0), EventId(0)).unwrap();
        assert_eq!(
            err,
            EpistemicError::MislabeledWorld {
                expected,
                actual: WorldId(expected.0 + 1000)
            }
        );
    }

    #[test]
    fn test_lineage_reports_both_colliding_pairs() {
        let mut lineage = HashMap::new();
        let id = WorldId(7);
        record_lineage(&mut lineage, id, WorldId(1), EventId(2)).unwrap();

        let err = record_lineage(&mut lineage, id, WorldId(3), EventId(0)).unwrap_err();
        assert_eq!(
            err,
            EpistemicError::IdCollision {
                world: WorldId(3),
                event: EventId(0),
                other_world: WorldId(1),
                other_event: EventId(2),
                id,
            }
        );
    }

    proptest! {
        #[test]
        fn prop_update_is_bijective_over_satisfying_pairs(n in 1u64..6) {
            let before = belief(n);
            let events = sense_cell();
            let after = product_update(&before, &events).unwrap();

            let mut expected = BTreeSet::new();
            for w in before.designated() {
                for e in events.events() {
                    if holds(&before, *w, &e.precondition) {
                        expected.insert((*w, e.id));
                    }
                }
            }

            let got: BTreeSet<(WorldId, EventId)> =
                after.designated().iter().map(|id| unpair_id(*id)).collect();
            prop_assert_eq!(got.len(), after.len());
            prop_assert_eq!(got, expected);
            prop_assert_eq!(after.model().len(), after.len());
        }
    }
}
