//! Harness configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Number of pose hypotheses, the true pose included
    pub hypotheses: usize,

    /// Lidar beams per scan, evenly spaced over a full turn
    pub beams: usize,

    /// Lidar maximum range in meters
    pub max_range: f64,

    /// Range noise standard deviation in meters
    pub sensor_noise_std: f64,

    /// Room size in cells
    pub room_width: u32,
    pub room_height: u32,

    /// Cell edge length in meters
    pub resolution: f64,

    /// Number of random interior obstacles
    pub obstacles: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            hypotheses: 8,
            beams: 16,
            max_range: 8.0,
            sensor_noise_std: 0.02,
            room_width: 40,
            room_height: 30,
            resolution: 0.1,
            obstacles: 6,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_hypotheses(mut self, hypotheses: usize) -> Self {
        self.hypotheses = hypotheses;
        self
    }

    pub fn with_beams(mut self, beams: usize) -> Self {
        self.beams = beams;
        self
    }
}
