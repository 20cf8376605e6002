//! Error types for the epistemic core.

use crate::event_model::EventId;
use crate::world::WorldId;
use thiserror::Error;

/// Errors raised while building models or evolving belief.
///
/// Unrecognized atoms and empty agent groups are deliberately absent:
/// they resolve to `false` and vacuous truth during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpistemicError {
    /// A relation edge or designated set referenced a world not in the model
    #[error("Unknown world: {0}")]
    UnknownWorld(WorldId),

    /// A relation edge referenced an event not in the event model
    #[error("Unknown event: {0}")]
    UnknownEvent(EventId),

    /// A world with this id is already present
    #[error("Duplicate world id: {0}")]
    DuplicateWorld(WorldId),

    /// An event with this id is already present
    #[error("Duplicate event id: {0}")]
    DuplicateEvent(EventId),

    /// Grid cell storage does not match width * height
    #[error("Invalid grid map: expected {expected} cells, got {actual}")]
    InvalidMap { expected: usize, actual: usize },

    /// Two distinct (world, event) pairs minted the same id
    #[error("Id collision: ({world}, {event}) and ({other_world}, {other_event}) both map to {id}")]
    IdCollision {
        world: WorldId,
        event: EventId,
        other_world: WorldId,
        other_event: EventId,
        id: WorldId,
    },

    /// A payload transform returned a world under the wrong id
    #[error("Mislabeled world: expected {expected}, transform returned {actual}")]
    MislabeledWorld { expected: WorldId, actual: WorldId },

    /// Pairing arithmetic would overflow the id space
    #[error("Id pairing overflow for ({world}, {event})")]
    PairingOverflow { world: WorldId, event: EventId },

    /// Product update output exceeded its configured bound
    #[error("Resource exhausted: {resource} exceeded limit of {limit}")]
    ResourceExhausted { resource: &'static str, limit: usize },

    /// Configuration failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl EpistemicError {
    /// Creates a resource exhaustion error.
    pub fn exhausted(resource: &'static str, limit: usize) -> Self {
        Self::ResourceExhausted { resource, limit }
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EpistemicError>;
