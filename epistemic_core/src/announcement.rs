//! Announcements and observations that reshape a belief state without
//! minting new worlds.
//!
//! Truth values are always taken in the *input* belief state; the result
//! is a fresh value and world ids are preserved.

use crate::agent::AgentId;
use crate::atoms::{AtomInterpreter, GridInterpreter};
use crate::belief::BeliefState;
use crate::formula::Formula;
use crate::query::Evaluator;
use crate::world::WorldId;
use std::collections::BTreeSet;
use tracing::debug;

/// Public announcement of φ: every world where φ is false is removed
/// from the model, along with its edges and its designation.
pub fn public_announcement(belief: &BeliefState, phi: &Formula) -> BeliefState {
    public_announcement_with(belief, phi, &GridInterpreter)
}

/// `public_announcement` under a caller-supplied domain binding.
pub fn public_announcement_with<I>(belief: &BeliefState, phi: &Formula, interpreter: &I) -> BeliefState
where
    I: AtomInterpreter + ?Sized,
{
    let eval = Evaluator::with_interpreter(belief, interpreter);
    let keep: BTreeSet<WorldId> = belief
        .model()
        .world_ids()
        .filter(|w| eval.holds(*w, phi))
        .collect();

    let model = belief.model().restricted_to(&keep);
    let designated: BTreeSet<WorldId> = belief.designated().intersection(&keep).copied().collect();
    debug!(
        "announced {}: worlds {} -> {}, designated {} -> {}",
        phi,
        belief.model().len(),
        model.len(),
        belief.len(),
        designated.len()
    );
    BeliefState::from_parts(model, designated)
}

/// Private observation of φ by `agent`: the observer can now separate
/// worlds that disagree on φ. Other agents' relations, the worlds and
/// the designated set are unchanged.
pub fn private_observation(belief: &BeliefState, agent: &AgentId, phi: &Formula) -> BeliefState {
    private_observation_with(belief, agent, phi, &GridInterpreter)
}

/// `private_observation` under a caller-supplied domain binding.
pub fn private_observation_with<I>(
    belief: &BeliefState,
    agent: &AgentId,
    phi: &Formula,
    interpreter: &I,
) -> BeliefState
where
    I: AtomInterpreter + ?Sized,
{
    let eval = Evaluator::with_interpreter(belief, interpreter);
    let truth: BTreeSet<WorldId> = belief
        .model()
        .world_ids()
        .filter(|w| eval.holds(*w, phi))
        .collect();

    let relation = belief.model().relation().filtered(|a, from, to| {
        a != agent || truth.contains(&from) == truth.contains(&to)
    });
    debug!(
        "{} observed {}: edges {} -> {}",
        agent,
        phi,
        belief.model().edge_count(),
        relation.len()
    );
    BeliefState::from_parts(
        belief.model().with_relation(relation),
        belief.designated().clone(),
    )
}
