//! Event models: possible events with preconditions and per-agent
//! indistinguishability.

use crate::agent::AgentId;
use crate::error::{EpistemicError, Result};
use crate::formula::Formula;
use crate::relation::Relation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of an event, unique within its event model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl EventId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A single epistemic event, possible wherever its precondition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub precondition: Formula,
}

impl Event {
    pub fn new(id: EventId, precondition: Formula) -> Self {
        Self { id, precondition }
    }
}

/// Events plus, per agent, which events it cannot tell apart.
///
/// Event models are transient: built from evidence, consumed by one
/// product update, then dropped.
#[derive(Debug, Clone, Default)]
pub struct EventModel {
    events: Vec<Event>,
    slots: HashMap<EventId, usize>,
    accessibility: Relation<EventId>,
}

impl EventModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event. Fails if its id is already taken.
    pub fn add_event(&mut self, event: Event) -> Result<()> {
        if self.slots.contains_key(&event.id) {
            return Err(EpistemicError::DuplicateEvent(event.id));
        }
        self.slots.insert(event.id, self.events.len());
        self.events.push(event);
        Ok(())
    }

    /// Adds edge (from, to) to `agent`'s relation. Both events must exist.
    pub fn add_edge(&mut self, agent: &AgentId, from: EventId, to: EventId) -> Result<()> {
        for id in [from, to] {
            if !self.slots.contains_key(&id) {
                return Err(EpistemicError::UnknownEvent(id));
            }
        }
        self.accessibility.insert(agent, from, to);
        Ok(())
    }

    pub fn accessible(&self, agent: &AgentId, from: EventId, to: EventId) -> bool {
        self.accessibility.contains(agent, from, to)
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.slots.get(&id).map(|slot| &self.events[*slot])
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn relation(&self) -> &Relation<EventId> {
        &self.accessibility
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.accessibility.len()
    }

    /// A single always-possible event that every listed agent observes.
    ///
    /// Updating with this model leaves a belief state unchanged up to
    /// relabeling of world ids.
    pub fn trivial<'a, I>(agents: I) -> Self
    where
        I: IntoIterator<Item = &'a AgentId>,
    {
        let mut model = Self::new();
        let id = EventId(0);
        model.slots.insert(id, 0);
        model.events.push(Event::new(id, Formula::top()));
        for agent in agents {
            model.accessibility.insert(agent, id, id);
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ids_unique() {
        let mut em = EventModel::new();
        em.add_event(Event::new(EventId(0), Formula::atom("p"))).unwrap();
        assert_eq!(
            em.add_event(Event::new(EventId(0), Formula::atom("q"))),
            Err(EpistemicError::DuplicateEvent(EventId(0)))
        );
        assert_eq!(em.len(), 1);
    }

    #[test]
    fn test_edge_to_missing_event_rejected() {
        let mut em = EventModel::new();
        let a = AgentId::new("a");
        em.add_event(Event::new(EventId(0), Formula::atom("p"))).unwrap();

        assert_eq!(
            em.add_edge(&a, EventId(0), EventId(3)),
            Err(EpistemicError::UnknownEvent(EventId(3)))
        );
        assert!(em.add_edge(&a, EventId(0), EventId(0)).is_ok());
        assert!(em.accessible(&a, EventId(0), EventId(0)));
    }

    #[test]
    fn test_trivial_model_is_reflexive_for_each_agent() {
        let agents = [AgentId::new("a"), AgentId::new("b")];
        let em = EventModel::trivial(agents.iter());
        assert_eq!(em.len(), 1);
        assert_eq!(em.edge_count(), 2);
        assert!(em.accessible(&agents[1], EventId(0), EventId(0)));
    }
}
