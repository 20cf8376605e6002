//! Ground truth oracle for simulation.
//!
//! The Oracle owns the "God's eye view" the robots are uncertain about:
//! - The true occupancy grid of a walled room with random obstacles
//! - The true robot pose
//! - Lidar scan generation (with range noise and dropout)

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use epistemic_core::{raycast, CellState, GridMap, LidarObservation, Pose, ScanGeometry};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;

const MAX_SAMPLE_ATTEMPTS: usize = 10_000;

/// Minimum distance in meters between the true pose and a false hypothesis.
const MIN_HYPOTHESIS_SEPARATION: f64 = 0.5;

/// The Oracle - holds ground truth and generates sensor data.
pub struct Oracle {
    rng: ChaCha8Rng,
    map: Arc<GridMap>,
    true_pose: Pose,
    noise: Normal<f64>,
    max_range: f64,
}

impl Oracle {
    /// Builds a room and places the robot, deterministically from `seed`.
    pub fn new(seed: u64, config: &SimConfig) -> SimResult<Self> {
        if config.room_width < 5 || config.room_height < 5 {
            return Err(SimError::setup("room must be at least 5x5 cells"));
        }
        if config.resolution.is_nan() || config.resolution <= 0.0 {
            return Err(SimError::setup("resolution must be positive"));
        }
        if config.max_range.is_nan() || config.max_range <= 0.0 {
            return Err(SimError::setup("max_range must be positive"));
        }
        let noise = Normal::new(0.0, config.sensor_noise_std)
            .map_err(|e| SimError::setup(format!("sensor noise: {}", e)))?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let map = Arc::new(build_room(&mut rng, config));
        let true_pose = sample_free_pose(&mut rng, &map)?;

        Ok(Self {
            rng,
            map,
            true_pose,
            noise,
            max_range: config.max_range,
        })
    }

    pub fn map(&self) -> &Arc<GridMap> {
        &self.map
    }

    pub fn true_pose(&self) -> Pose {
        self.true_pose
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Returns `count` candidate poses; the true pose is always first.
    pub fn pose_hypotheses(&mut self, count: usize) -> SimResult<Vec<Pose>> {
        let mut poses = vec![self.true_pose];
        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            if poses.len() >= count {
                return Ok(poses);
            }
            let candidate = sample_free_pose(&mut self.rng, &self.map)?;
            let dist = (candidate.x - self.true_pose.x).hypot(candidate.y - self.true_pose.y);
            if dist >= MIN_HYPOTHESIS_SEPARATION {
                poses.push(candidate);
            }
        }
        if poses.len() >= count {
            Ok(poses)
        } else {
            Err(SimError::setup(format!("only {} of {} pose hypotheses placed", poses.len(), count)))
        }
    }

    /// Picks a free interior cell other than the one the robot stands in.
    pub fn sample_free_cell(&mut self) -> SimResult<(u32, u32)> {
        let robot = self.map.cell_of(self.true_pose.x, self.true_pose.y);
        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            let x = self.rng.gen_range(1..self.map.width() - 1);
            let y = self.rng.gen_range(1..self.map.height() - 1);
            if self.map.at(x as i64, y as i64) == Some(CellState::Free) && robot != Some((x as i64, y as i64)) {
                return Ok((x, y));
            }
        }
        Err(SimError::setup("no free cell found"))
    }

    /// Copy of the true map with the given cells marked occupied.
    pub fn map_with_occupied(&self, cells: &[(u32, u32)]) -> Arc<GridMap> {
        let mut map = (*self.map).clone();
        for &(x, y) in cells {
            map.set(x, y, CellState::Occupied);
        }
        Arc::new(map)
    }

    /// Generates a noisy scan from the true pose.
    ///
    /// Each beam independently drops out with `dropout_prob`, reading 0.0.
    /// Beams that hit nothing read `max_range`.
    pub fn scan(&mut self, geometry: &ScanGeometry, beams: usize, dropout_prob: f64) -> LidarObservation {
        let ranges = (0..beams)
            .map(|i| {
                let bearing = geometry.bearing(&self.true_pose, i);
                let range = raycast(&self.map, self.true_pose.x, self.true_pose.y, bearing, self.max_range);
                if self.rng.gen::<f64>() < dropout_prob {
                    0.0
                } else if range >= self.max_range {
                    self.max_range
                } else {
                    range + self.noise.sample(&mut self.rng)
                }
            })
            .collect();

        LidarObservation {
            ranges,
            max_range: self.max_range,
        }
    }
}

/// Walled room with random rectangular obstacles.
fn build_room(rng: &mut ChaCha8Rng, config: &SimConfig) -> GridMap {
    let (w, h) = (config.room_width, config.room_height);
    let mut map = GridMap::filled(w, h, config.resolution, CellState::Free);

    for x in 0..w {
        map.set(x, 0, CellState::Occupied);
        map.set(x, h - 1, CellState::Occupied);
    }
    for y in 0..h {
        map.set(0, y, CellState::Occupied);
        map.set(w - 1, y, CellState::Occupied);
    }

    for _ in 0..config.obstacles {
        let size_x = rng.gen_range(1..=3u32).min(w - 4);
        let size_y = rng.gen_range(1..=3u32).min(h - 4);
        let x0 = rng.gen_range(2..=w - 2 - size_x);
        let y0 = rng.gen_range(2..=h - 2 - size_y);
        for x in x0..x0 + size_x {
            for y in y0..y0 + size_y {
                map.set(x, y, CellState::Occupied);
            }
        }
    }

    map
}

/// Pose at the center of a free cell whose eight neighbors are free too.
fn sample_free_pose(rng: &mut ChaCha8Rng, map: &GridMap) -> SimResult<Pose> {
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let cx = rng.gen_range(1..map.width() as i64 - 1);
        let cy = rng.gen_range(1..map.height() as i64 - 1);
        let clear = (-1..=1).all(|dx| (-1..=1).all(|dy| map.at(cx + dx, cy + dy) == Some(CellState::Free)));
        if clear {
            let theta = rng.gen_range(0.0..std::f64::consts::TAU);
            let res = map.resolution();
            return Ok(Pose::new((cx as f64 + 0.5) * res, (cy as f64 + 0.5) * res, theta));
        }
    }
    Err(SimError::setup("no free pose found"))
}
