//! World hypotheses: occupancy grid, agent poses and goals.
//!
//! A `World` is one hypothesis about the shared environment. Worlds are
//! produced by the mapping front end and are immutable once placed in a
//! model; the grid is reference counted so that product update can copy
//! a parent's payload into many children without duplicating cells.

use crate::agent::AgentId;
use crate::error::{EpistemicError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Identifier of a world, unique within its owning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldId(pub u64);

impl WorldId {
    /// Returns the raw id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Planar pose of an agent [x, y] in meters, heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }
}

/// Occupancy state of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellState {
    #[default]
    Unknown = 0,
    Free = 1,
    Occupied = 2,
}

/// Row-major occupancy grid, cell (x, y) stored at `y * width + x`.
///
/// Deserialization goes through `GridMap::new`, so a cell count that does
/// not match the dimensions is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridMapRaw")]
pub struct GridMap {
    width: u32,
    height: u32,

    /// Meters per cell
    resolution: f64,

    cells: Vec<CellState>,
}

/// Unvalidated wire form of `GridMap`.
#[derive(Deserialize)]
struct GridMapRaw {
    width: u32,
    height: u32,
    resolution: f64,
    cells: Vec<CellState>,
}

impl TryFrom<GridMapRaw> for GridMap {
    type Error = EpistemicError;

    fn try_from(raw: GridMapRaw) -> Result<Self> {
        GridMap::new(raw.width, raw.height, raw.resolution, raw.cells)
    }
}

impl GridMap {
    /// Creates a grid from existing cell storage.
    ///
    /// Fails with `InvalidMap` if `cells.len() != width * height`.
    pub fn new(width: u32, height: u32, resolution: f64, cells: Vec<CellState>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(EpistemicError::InvalidMap {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            resolution,
            cells,
        })
    }

    /// Creates a grid where every cell has the same state.
    pub fn filled(width: u32, height: u32, resolution: f64, state: CellState) -> Self {
        Self {
            width,
            height,
            resolution,
            cells: vec![state; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Returns the state of cell (x, y), or `None` outside the grid.
    pub fn at(&self, x: i64, y: i64) -> Option<CellState> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        self.cells
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Sets the state of cell (x, y). Out-of-grid writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, state: CellState) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.cells[idx] = state;
        }
    }

    /// Maps a metric position to the cell containing it.
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        if self.resolution.is_nan() || self.resolution <= 0.0 || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let cx = (x / self.resolution).floor() as i64;
        let cy = (y / self.resolution).floor() as i64;
        self.at(cx, cy).map(|_| (cx, cy))
    }

    /// Number of cells in a given state.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|c| **c == state).count()
    }
}

/// A single hypothesis about the map, agent poses and agent goals.
///
/// Identity is the id: two worlds compare equal iff their ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub id: WorldId,

    pub map: Arc<GridMap>,

    /// Physical state
    pub poses: BTreeMap<AgentId, Pose>,

    /// Intentional state (goal label per agent)
    pub goals: BTreeMap<AgentId, String>,
}

impl World {
    /// Creates a world with no poses or goals.
    pub fn new(id: WorldId, map: Arc<GridMap>) -> Self {
        Self {
            id,
            map,
            poses: BTreeMap::new(),
            goals: BTreeMap::new(),
        }
    }

    /// Builder: places an agent at a pose.
    pub fn with_pose(mut self, agent: impl Into<AgentId>, pose: Pose) -> Self {
        self.poses.insert(agent.into(), pose);
        self
    }

    /// Builder: assigns a goal label to an agent.
    pub fn with_goal(mut self, agent: impl Into<AgentId>, goal: impl Into<String>) -> Self {
        self.goals.insert(agent.into(), goal.into());
        self
    }

    /// Returns a copy of this world's payload under a new id.
    pub fn relabeled(&self, id: WorldId) -> Self {
        Self {
            id,
            map: Arc::clone(&self.map),
            poses: self.poses.clone(),
            goals: self.goals.clone(),
        }
    }
}

impl PartialEq for World {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for World {}
