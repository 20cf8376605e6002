//! The satisfaction relation: `belief, w ⊨ φ`.
//!
//! Semantics of the modal operators:
//! - `K_a(φ)` holds at w iff φ holds at every *designated* world that a
//!   cannot distinguish from w. An agent with no edges at w knows
//!   everything vacuously.
//! - `C_G(φ)` holds at w iff φ holds at every world reachable from w in
//!   zero or more steps along any member's relation, over the *whole*
//!   model (common knowledge is a global reachability property).
//! - `E_G(φ)` is the conjunction of `K_a(φ)` over a ∈ G.
//!
//! Group operators over an empty group are vacuously true.

use crate::agent::{AgentGroup, AgentId};
use crate::atoms::{AtomInterpreter, GridInterpreter};
use crate::belief::BeliefState;
use crate::formula::Formula;
use crate::kripke::KripkeModel;
use crate::world::WorldId;
use std::collections::{BTreeSet, VecDeque};

/// Evaluates formulas against one belief state.
pub struct Evaluator<'a, I: ?Sized = GridInterpreter> {
    belief: &'a BeliefState,
    interpreter: &'a I,
}

impl<'a> Evaluator<'a, GridInterpreter> {
    /// Evaluator using the grid predicates.
    pub fn new(belief: &'a BeliefState) -> Self {
        Self {
            belief,
            interpreter: &GridInterpreter,
        }
    }
}

impl<'a, I: AtomInterpreter + ?Sized> Evaluator<'a, I> {
    /// Evaluator with a caller-supplied domain binding.
    pub fn with_interpreter(belief: &'a BeliefState, interpreter: &'a I) -> Self {
        Self {
            belief,
            interpreter,
        }
    }

    pub fn belief(&self) -> &'a BeliefState {
        self.belief
    }

    /// Returns true iff φ holds at `world`. Unknown worlds satisfy nothing.
    pub fn holds(&self, world: WorldId, phi: &Formula) -> bool {
        if !self.belief.model().contains(world) {
            return false;
        }
        self.eval(world, phi)
    }

    /// True iff φ holds at every designated world.
    ///
    /// An empty designated set yields vacuous truth.
    pub fn holds_in_all(&self, phi: &Formula) -> bool {
        self.belief
            .designated()
            .iter()
            .all(|w| self.holds(*w, phi))
    }

    /// Designated worlds at which φ holds.
    pub fn worlds_where(&self, phi: &Formula) -> BTreeSet<WorldId> {
        self.belief
            .designated()
            .iter()
            .copied()
            .filter(|w| self.holds(*w, phi))
            .collect()
    }

    fn eval(&self, world: WorldId, phi: &Formula) -> bool {
        match phi {
            Formula::Atom(name) => self
                .belief
                .model()
                .world(world)
                .map_or(false, |w| self.interpreter.interpret(w, name)),
            Formula::Not(inner) => !self.eval(world, inner),
            Formula::And(l, r) => self.eval(world, l) && self.eval(world, r),
            Formula::Or(l, r) => self.eval(world, l) || self.eval(world, r),
            Formula::Implies(l, r) => !self.eval(world, l) || self.eval(world, r),
            Formula::Knows(agent, inner) => self.knows(agent, world, inner),
            Formula::CommonKnowledge(group, inner) => self.common_knowledge(group, world, inner),
            Formula::EverybodyKnows(group, inner) => {
                group.iter().all(|agent| self.knows(agent, world, inner))
            }
        }
    }

    fn knows(&self, agent: &AgentId, world: WorldId, phi: &Formula) -> bool {
        self.belief
            .model()
            .relation()
            .successors(agent, world)
            .filter(|w2| self.belief.is_designated(*w2))
            .all(|w2| self.eval(w2, phi))
    }

    fn common_knowledge(&self, group: &AgentGroup, world: WorldId, phi: &Formula) -> bool {
        if group.is_empty() {
            return true;
        }
        group_reachable(self.belief.model(), world, group)
            .into_iter()
            .all(|w| self.eval(w, phi))
    }
}

/// Worlds reachable from `start` in zero or more steps along the union of
/// the group's relations. `start` is always included.
///
/// Breadth-first with a visited set, so cyclic and reflexive relations
/// terminate in O(|worlds| + |edges|).
pub fn group_reachable(model: &KripkeModel, start: WorldId, group: &AgentGroup) -> BTreeSet<WorldId> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for agent in group {
            for next in model.relation().successors(agent, current) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    visited
}

/// `belief, w ⊨ φ` under the grid predicates.
pub fn holds(belief: &BeliefState, world: WorldId, phi: &Formula) -> bool {
    Evaluator::new(belief).holds(world, phi)
}

/// φ holds at every designated world under the grid predicates.
pub fn holds_in_all(belief: &BeliefState, phi: &Formula) -> bool {
    Evaluator::new(belief).holds_in_all(phi)
}

/// Designated worlds satisfying φ under the grid predicates.
pub fn worlds_where(belief: &BeliefState, phi: &Formula) -> BTreeSet<WorldId> {
    Evaluator::new(belief).worlds_where(phi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::group;
    use crate::world::{CellState, GridMap, World};
    use proptest::prelude::*;
    use std::sync::Arc;

    /// Three worlds differing in whether cell (1,0) and (2,0) are free.
    /// w0: both free, w1: only (1,0) free, w2: neither free.
    fn corridor() -> KripkeModel {
        let mut model = KripkeModel::new();
        let layouts = [
            [CellState::Free, CellState::Free],
            [CellState::Free, CellState::Occupied],
            [CellState::Occupied, CellState::Occupied],
        ];
        for (i, layout) in layouts.iter().enumerate() {
            let mut map = GridMap::filled(3, 1, 1.0, CellState::Free);
            map.set(1, 0, layout[0]);
            map.set(2, 0, layout[1]);
            model
                .add_world(World::new(WorldId(i as u64), Arc::new(map)))
                .unwrap();
        }
        model
    }

    fn a() -> AgentId {
        AgentId::new("a")
    }

    fn b() -> AgentId {
        AgentId::new("b")
    }

    fn ids(raw: &[u64]) -> Vec<WorldId> {
        raw.iter().map(|i| WorldId(*i)).collect()
    }

    /// a confuses w0/w1, b confuses w1/w2; everything reflexive.
    fn chain_belief() -> BeliefState {
        let mut model = corridor();
        model.add_indistinguishable(&a(), &ids(&[0, 1])).unwrap();
        model.add_indistinguishable(&a(), &ids(&[2])).unwrap();
        model.add_indistinguishable(&b(), &ids(&[1, 2])).unwrap();
        model.add_indistinguishable(&b(), &ids(&[0])).unwrap();
        BeliefState::all_designated(model)
    }

    #[test]
    fn test_atom_and_unknown_world() {
        let belief = chain_belief();
        let p = Formula::atom("cell_free(1,0)");

        assert!(holds(&belief, WorldId(0), &p));
        assert!(!holds(&belief, WorldId(2), &p));
        assert!(!holds(&belief, WorldId(42), &p));
        assert!(!holds(&belief, WorldId(42), &Formula::not(p)));
    }

    #[test]
    fn test_knows_respects_accessibility() {
        let belief = chain_belief();
        let p = Formula::atom("cell_free(1,0)");
        let q = Formula::atom("cell_free(2,0)");

        // a at w0 considers w0, w1: (1,0) free in both, (2,0) not.
        assert!(holds(&belief, WorldId(0), &Formula::knows(a(), p.clone())));
        assert!(!holds(&belief, WorldId(0), &Formula::knows(a(), q.clone())));
        // b at w1 considers w1, w2
        assert!(!holds(&belief, WorldId(1), &Formula::knows(b(), p.clone())));
        assert!(holds(&belief, WorldId(1), &Formula::knows(b(), Formula::not(q))));
    }

    #[test]
    fn test_knows_restricted_to_designated() {
        let mut model = corridor();
        model.add_indistinguishable(&a(), &ids(&[0, 2])).unwrap();
        let p = Formula::atom("cell_free(1,0)");

        let all = BeliefState::all_designated(model.clone());
        assert!(!holds(&all, WorldId(0), &Formula::knows(a(), p.clone())));

        // once w2 is no longer live, a's doubt about it disappears
        let narrowed = BeliefState::new(model, ids(&[0, 1])).unwrap();
        assert!(holds(&narrowed, WorldId(0), &Formula::knows(a(), p)));
    }

    #[test]
    fn test_agent_without_edges_knows_vacuously() {
        let belief = chain_belief();
        let falsum = Formula::and(Formula::atom("p"), Formula::not(Formula::atom("p")));
        assert!(holds(&belief, WorldId(0), &Formula::knows("nobody", falsum)));
    }

    #[test]
    fn test_common_knowledge_follows_chains() {
        let belief = chain_belief();
        let g = group(["a", "b"]);
        let p = Formula::atom("cell_free(1,0)");

        // everybody knows p at w0 but w0 -a- w1 -b- w2 and p fails at w2
        assert!(holds(&belief, WorldId(0), &Formula::everybody_knows(g.clone(), p.clone())));
        assert!(!holds(&belief, WorldId(0), &Formula::common_knowledge(g.clone(), p.clone())));

        let wall = Formula::atom("cell_free(0,0)");
        assert!(holds(&belief, WorldId(0), &Formula::common_knowledge(g, wall)));
    }

    #[test]
    fn test_common_knowledge_cycle_terminates() {
        let mut model = corridor();
        model.add_edge(&a(), WorldId(0), WorldId(1)).unwrap();
        model.add_edge(&a(), WorldId(1), WorldId(0)).unwrap();

        let reach = group_reachable(&model, WorldId(0), &group(["a"]));
        assert_eq!(reach, ids(&[0, 1]).into_iter().collect());
    }

    #[test]
    fn test_empty_group_is_vacuous() {
        let belief = chain_belief();
        let falsum = Formula::and(Formula::atom("p"), Formula::not(Formula::atom("p")));

        assert!(holds(&belief, WorldId(2), &Formula::common_knowledge(AgentGroup::new(), falsum.clone())));
        assert!(holds(&belief, WorldId(2), &Formula::everybody_knows(AgentGroup::new(), falsum)));
    }

    #[test]
    fn test_holds_in_all_and_worlds_where() {
        let belief = chain_belief();
        let p = Formula::atom("cell_free(1,0)");

        assert!(!holds_in_all(&belief, &p));
        assert!(holds_in_all(&belief, &Formula::atom("cell_free(0,0)")));
        assert_eq!(worlds_where(&belief, &p), ids(&[0, 1]).into_iter().collect());

        let empty = BeliefState::new(corridor(), []).unwrap();
        assert!(holds_in_all(&empty, &Formula::atom("never")));
    }

    // ---------------------------------------------------------------------
    // Algebraic properties
    // ---------------------------------------------------------------------

    fn arb_formula() -> impl Strategy<Value = Formula> {
        let leaf = prop_oneof![
            Just(Formula::atom("cell_free(1,0)")),
            Just(Formula::atom("cell_free(2,0)")),
            Just(Formula::atom("cell_occupied(2,0)")),
            Just(Formula::atom("garbage")),
        ];
        leaf.prop_recursive(4, 24, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(Formula::not),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::and(l, r)),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::or(l, r)),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::implies(l, r)),
                inner.clone().prop_map(|f| Formula::knows("a", f)),
                inner.clone().prop_map(|f| Formula::knows("b", f)),
                inner.clone().prop_map(|f| Formula::common_knowledge(group(["a", "b"]), f)),
                inner.prop_map(|f| Formula::everybody_knows(group(["a", "b"]), f)),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_negation_and_de_morgan(phi in arb_formula(), psi in arb_formula(), w in 0u64..3) {
            let belief = chain_belief();
            let w = WorldId(w);
            let h = |f: &Formula| holds(&belief, w, f);

            prop_assert_eq!(h(&Formula::not(phi.clone())), !h(&phi));
            prop_assert_eq!(
                h(&Formula::not(Formula::and(phi.clone(), psi.clone()))),
                h(&Formula::or(Formula::not(phi.clone()), Formula::not(psi.clone())))
            );
            prop_assert_eq!(
                h(&Formula::not(Formula::or(phi.clone(), psi.clone()))),
                h(&Formula::and(Formula::not(phi.clone()), Formula::not(psi.clone())))
            );
            prop_assert_eq!(
                h(&Formula::implies(phi.clone(), psi.clone())),
                h(&Formula::or(Formula::not(phi), psi))
            );
        }

        #[test]
        fn prop_group_operators(phi in arb_formula(), w in 0u64..3) {
            let belief = chain_belief();
            let w = WorldId(w);

            prop_assert_eq!(
                holds(&belief, w, &Formula::everybody_knows(group(["a"]), phi.clone())),
                holds(&belief, w, &Formula::knows("a", phi.clone()))
            );

            let g = group(["a", "b"]);
            if holds(&belief, w, &Formula::common_knowledge(g.clone(), phi.clone())) {
                prop_assert!(holds(&belief, w, &Formula::everybody_knows(g, phi)));
            }
        }

        #[test]
        fn prop_clone_evaluates_identically(phi in arb_formula()) {
            let belief = chain_belief();
            let copy = belief.clone();
            for w in belief.model().world_ids() {
                prop_assert_eq!(holds(&belief, w, &phi), holds(&copy, w, &phi));
            }
        }
    }
}
