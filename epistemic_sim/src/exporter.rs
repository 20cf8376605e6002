//! JSON exporter for CI.
//!
//! Serializes a batch of scenario results together with the configuration
//! that produced them.

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::runner::ScenarioResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Complete export of one harness invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Configuration shared by all runs (seed = base seed)
    pub config: SimConfig,

    pub total: usize,
    pub passed: usize,
    pub failed: usize,

    /// Per-run results in execution order
    pub results: Vec<ScenarioResult>,
}

impl SimExport {
    /// Creates an empty export container.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            total: 0,
            passed: 0,
            failed: 0,
            results: Vec::new(),
        }
    }

    /// Records a result.
    pub fn add_result(&mut self, result: ScenarioResult) {
        self.total += 1;
        if result.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
