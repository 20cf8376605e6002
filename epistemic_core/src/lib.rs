//! Epistemic Core - Dynamic Epistemic Logic for Robot Belief States
//!
//! This library models what a group of robots knows about a shared world:
//! 1. **Belief states**: multi-pointed Kripke models over map/pose/goal hypotheses
//! 2. **Queries**: Knows, EverybodyKnows and CommonKnowledge evaluated over designated worlds
//! 3. **Evolution**: DEL product update, public announcement and private observation
//! 4. **Sensing**: lidar scans turned into event models
//!
//! Every update is a pure function of its inputs: a belief state is never
//! modified in place, and world ids of updated worlds are derived
//! deterministically from (parent world, event) by Cantor pairing.

pub mod agent;
pub mod announcement;
pub mod atoms;
pub mod belief;
pub mod config;
pub mod del_update;
pub mod error;
pub mod event_model;
pub mod formula;
pub mod kripke;
pub mod lidar_event;
pub mod query;
pub mod relation;
pub mod world;

// Re-export key types for convenience
pub use agent::{group, AgentGroup, AgentId};
pub use announcement::{private_observation, private_observation_with, public_announcement, public_announcement_with};
pub use atoms::{AtomInterpreter, GridInterpreter};
pub use belief::BeliefState;
pub use config::UpdateConfig;
pub use del_update::{pair_ids, product_update, unpair_id, CopyPayload, PayloadTransform, ProductUpdate, UpdateStats};
pub use error::{EpistemicError, Result};
pub use event_model::{Event, EventId, EventModel};
pub use formula::Formula;
pub use kripke::KripkeModel;
pub use lidar_event::{
    build_lidar_event, build_lidar_event_for, raycast, sensing_agent, LidarObservation, LidarSensorModel,
    ScanGeometry, ScanInterpreter,
};
pub use query::{group_reachable, holds, holds_in_all, worlds_where, Evaluator};
pub use relation::Relation;
pub use world::{CellState, GridMap, Pose, World, WorldId};
