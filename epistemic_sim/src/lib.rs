//! Epistemic Simulation Harness
//!
//! Deterministic scenarios that drive `epistemic_core` against a seeded
//! ground truth:
//! - **Oracle**: a walled room with random obstacles, the true robot pose,
//!   and noisy lidar scans with dropout, all derived from one 64-bit seed
//! - **Scenarios**: localization, announcements, private observation,
//!   unreliable sensing and shared goals, each checking epistemic facts
//!   that must hold whatever the seed
//!
//! # Usage
//!
//! ```ignore
//! use epistemic_sim::{ScenarioRunner, SimConfig};
//! use epistemic_sim::scenarios::ScenarioId;
//!
//! let runner = ScenarioRunner::new(SimConfig::default().with_seed(7));
//! let result = runner.run(ScenarioId::LidarLocalization);
//! assert!(result.metrics.truth_retained);
//! ```

mod config;
mod error;
mod oracle;
pub mod exporter;
pub mod runner;
pub mod scenarios;

pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use exporter::SimExport;
pub use oracle::Oracle;
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
