//! Belief-evolution scenarios.

use serde::{Deserialize, Serialize};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// EPI-001: lidar scan prunes pose hypotheses, truth survives
    LidarLocalization,

    /// EPI-002: announced map fact becomes common knowledge
    PublicAnnouncement,

    /// EPI-003: only the observer learns a privately sensed fact
    PrivateObservation,

    /// EPI-004: unreliable sensor carries no bin information
    SensorDropout,

    /// EPI-005: goals move from private to common ground
    CommonGround,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::LidarLocalization,
            ScenarioId::PublicAnnouncement,
            ScenarioId::PrivateObservation,
            ScenarioId::SensorDropout,
            ScenarioId::CommonGround,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::LidarLocalization => "lidar_localization",
            ScenarioId::PublicAnnouncement => "public_announcement",
            ScenarioId::PrivateObservation => "private_observation",
            ScenarioId::SensorDropout => "sensor_dropout",
            ScenarioId::CommonGround => "common_ground",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::LidarLocalization => "Noisy lidar scan against N pose hypotheses, true pose must survive",
            ScenarioId::PublicAnnouncement => "Two robots doubt a cell, announcement yields common knowledge",
            ScenarioId::PrivateObservation => "One robot senses a cell privately, the other stays uncertain",
            ScenarioId::SensorDropout => "70% beam dropout, event model fully connected",
            ScenarioId::CommonGround => "Goal known to its owner only, then announced to the team",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lidar_localization" | "lidar" | "epi-001" => Ok(ScenarioId::LidarLocalization),
            "public_announcement" | "announcement" | "epi-002" => Ok(ScenarioId::PublicAnnouncement),
            "private_observation" | "observation" | "epi-003" => Ok(ScenarioId::PrivateObservation),
            "sensor_dropout" | "dropout" | "epi-004" => Ok(ScenarioId::SensorDropout),
            "common_ground" | "goals" | "epi-005" => Ok(ScenarioId::CommonGround),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
