//! Lidar evidence as a DEL event model.
//!
//! Each range bin i becomes an event with precondition `lidar_bin_i`. The
//! sensing agent cannot tell two bins apart when:
//! - they are the same bin (reflexivity),
//! - both readings are invalid (no return or beyond max range),
//! - their ranges differ by at most the sensor's sigma,
//! - or the sensor is unreliable (dropout probability above 0.5), in
//!   which case every bin is indistinguishable from every other.
//!
//! `ScanInterpreter` gives `lidar_bin_i` a meaning against a world: beam i,
//! ray-cast from the sensing agent's pose through the world's grid,
//! predicts the observed range.

use crate::agent::AgentId;
use crate::atoms::{AtomInterpreter, GridInterpreter};
use crate::error::Result;
use crate::event_model::{Event, EventId, EventModel};
use crate::formula::Formula;
use crate::world::{CellState, GridMap, Pose, World};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Atom prefix bound to range bins.
pub const LIDAR_BIN_PREFIX: &str = "lidar_bin_";

/// Dropout probability above which a scan carries no discriminating
/// information.
pub const UNRELIABLE_DROPOUT: f64 = 0.5;

/// One lidar sweep: ordered range readings in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LidarObservation {
    pub ranges: Vec<f64>,
    pub max_range: f64,
}

impl LidarObservation {
    /// A reading is invalid when there was no return or it is out of range.
    pub fn is_invalid(&self, range: f64) -> bool {
        range.is_nan() || range <= 0.0 || range >= self.max_range
    }
}

/// Noise model of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidarSensorModel {
    /// Range noise bound in meters (Gaussian sigma)
    pub sigma: f64,

    /// Probability of a missed detection
    pub dropout_prob: f64,
}

impl Default for LidarSensorModel {
    fn default() -> Self {
        Self {
            sigma: 0.05,
            dropout_prob: 0.0,
        }
    }
}

/// The implicit agent that owns lidar evidence.
pub fn sensing_agent() -> AgentId {
    AgentId::new("sensor")
}

/// Atom name for range bin `i`.
pub fn bin_atom(i: usize) -> String {
    format!("{}{}", LIDAR_BIN_PREFIX, i)
}

/// Builds the event model for a scan, observed by `sensing_agent()`.
pub fn build_lidar_event(obs: &LidarObservation, model: &LidarSensorModel) -> Result<EventModel> {
    build_lidar_event_for(&sensing_agent(), obs, model)
}

/// Builds the event model for a scan observed by `agent`.
///
/// An empty scan yields an empty event model.
pub fn build_lidar_event_for(
    agent: &AgentId,
    obs: &LidarObservation,
    model: &LidarSensorModel,
) -> Result<EventModel> {
    let mut em = EventModel::new();
    let n = obs.ranges.len();

    for i in 0..n {
        em.add_event(Event::new(EventId(i as u64), Formula::atom(bin_atom(i))))?;
    }

    let unreliable = model.dropout_prob > UNRELIABLE_DROPOUT;
    for (i, &ri) in obs.ranges.iter().enumerate() {
        for (j, &rj) in obs.ranges.iter().enumerate() {
            let indistinguishable = unreliable
                || i == j
                || (obs.is_invalid(ri) && obs.is_invalid(rj))
                || (ri - rj).abs() <= model.sigma;
            if indistinguishable {
                em.add_edge(agent, EventId(i as u64), EventId(j as u64))?;
            }
        }
    }

    debug!(
        "lidar event model: {} bins, {} edges, unreliable={}",
        n,
        em.edge_count(),
        unreliable
    );
    Ok(em)
}

/// Range to the first occupied cell along a ray, or `max_range` on a miss.
///
/// Unknown cells are transparent; leaving the grid counts as a miss.
pub fn raycast(map: &GridMap, x: f64, y: f64, angle: f64, max_range: f64) -> f64 {
    let step = map.resolution() / 4.0;
    if step.is_nan() || step <= 0.0 {
        return max_range;
    }
    let (dx, dy) = (angle.cos(), angle.sin());
    let mut t = 0.0;
    while t < max_range {
        let Some((cx, cy)) = map.cell_of(x + dx * t, y + dy * t) else {
            return max_range;
        };
        if map.at(cx, cy) == Some(CellState::Occupied) {
            return t;
        }
        t += step;
    }
    max_range
}

/// Beam geometry of a scan, relative to the sensor heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanGeometry {
    pub angle_min: f64,
    pub angle_increment: f64,
}

impl ScanGeometry {
    /// `beams` beams evenly covering a full turn.
    pub fn full_turn(beams: usize) -> Self {
        Self {
            angle_min: 0.0,
            angle_increment: std::f64::consts::TAU / beams.max(1) as f64,
        }
    }

    /// Absolute bearing of beam `i` for a sensor at `pose`.
    pub fn bearing(&self, pose: &Pose, i: usize) -> f64 {
        pose.theta + self.angle_min + self.angle_increment * i as f64
    }
}

/// Interprets `lidar_bin_i` as "beam i is consistent with this world".
///
/// A bin holds at a world when the sensing agent has a pose there and the
/// range predicted by ray-casting the world's grid matches the observed
/// reading within sigma plus one cell of grid quantization, or when both
/// are no-returns. Every other atom is delegated to `GridInterpreter`.
#[derive(Debug, Clone)]
pub struct ScanInterpreter {
    agent: AgentId,
    observation: LidarObservation,
    sensor: LidarSensorModel,
    geometry: ScanGeometry,
}

impl ScanInterpreter {
    pub fn new(
        agent: AgentId,
        observation: LidarObservation,
        sensor: LidarSensorModel,
        geometry: ScanGeometry,
    ) -> Self {
        Self {
            agent,
            observation,
            sensor,
            geometry,
        }
    }

    /// Range that beam `i` would read in `world`, if the agent is placed.
    pub fn predicted_range(&self, world: &World, i: usize) -> Option<f64> {
        let pose = world.poses.get(&self.agent)?;
        let bearing = self.geometry.bearing(pose, i);
        Some(raycast(&world.map, pose.x, pose.y, bearing, self.observation.max_range))
    }

    fn bin_consistent(&self, world: &World, i: usize) -> bool {
        let Some(&observed) = self.observation.ranges.get(i) else {
            return false;
        };
        let Some(predicted) = self.predicted_range(world, i) else {
            return false;
        };
        let obs = &self.observation;
        if obs.is_invalid(observed) || obs.is_invalid(predicted) {
            return obs.is_invalid(observed) && obs.is_invalid(predicted);
        }
        (observed - predicted).abs() <= self.sensor.sigma + world.map.resolution()
    }
}

impl AtomInterpreter for ScanInterpreter {
    fn interpret(&self, world: &World, atom: &str) -> bool {
        match atom.strip_prefix(LIDAR_BIN_PREFIX) {
            Some(index) => index
                .parse::<usize>()
                .map_or(false, |i| self.bin_consistent(world, i)),
            None => GridInterpreter.interpret(world, atom),
        }
    }
}
