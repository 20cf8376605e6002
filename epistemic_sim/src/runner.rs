//! Scenario runner - executes belief-evolution scenarios against an oracle.

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::oracle::Oracle;
use crate::scenarios::ScenarioId;

use epistemic_core::{
    build_lidar_event, group, product_update, public_announcement, public_announcement_with, private_observation,
    unpair_id, AgentId, BeliefState, Evaluator, EventModel, Formula, GridMap, KripkeModel, LidarObservation,
    LidarSensorModel, Pose, ProductUpdate, ScanGeometry, ScanInterpreter, World, WorldId,
};
use epistemic_core::lidar_event::{bin_atom, sensing_agent};
use epistemic_core::query::holds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Every scenario places the ground truth at this world id.
const TRUTH: WorldId = WorldId(0);

/// Beam dropout used by the dropout scenario.
const HEAVY_DROPOUT: f64 = 0.7;

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    /// Designated worlds before the main update
    pub worlds_before: usize,

    /// Designated worlds after the main update
    pub worlds_after: usize,

    pub edges_before: usize,
    pub edges_after: usize,

    /// Events in the applied event model (0 for announcements)
    pub events: usize,

    /// Hypotheses still considered possible
    pub hypotheses_retained: usize,

    /// Hypotheses ruled out
    pub hypotheses_dropped: usize,

    /// Whether the ground-truth world survived
    pub truth_retained: bool,
}

/// Collects failed assertions of one run.
#[derive(Default)]
struct Checks {
    failures: Vec<String>,
}

impl Checks {
    fn ensure(&mut self, condition: bool, message: impl Into<String>) {
        if !condition {
            let message = message.into();
            warn!("  assertion failed: {}", message);
            self.failures.push(message);
        }
    }
}

/// Runs belief-evolution scenarios.
pub struct ScenarioRunner {
    config: SimConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Physics seed, decorrelated from the master seed.
    fn physics_seed(&self) -> u64 {
        self.config.seed.wrapping_mul(0x9e3779b97f4a7c15)
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.config.seed);

        let outcome = match scenario {
            ScenarioId::LidarLocalization => self.run_lidar_localization(),
            ScenarioId::PublicAnnouncement => self.run_public_announcement(),
            ScenarioId::PrivateObservation => self.run_private_observation(),
            ScenarioId::SensorDropout => self.run_sensor_dropout(),
            ScenarioId::CommonGround => self.run_common_ground(),
        };

        match outcome {
            Ok((metrics, checks)) => ScenarioResult {
                scenario,
                seed: self.config.seed,
                passed: checks.failures.is_empty(),
                failure_reason: (!checks.failures.is_empty()).then(|| checks.failures.join("; ")),
                metrics,
            },
            Err(e) => ScenarioResult {
                scenario,
                seed: self.config.seed,
                passed: false,
                failure_reason: Some(e.to_string()),
                metrics: ScenarioMetrics::default(),
            },
        }
    }

    /// EPI-001: the scan is consistent with the true pose, so the truth
    /// must survive both the product update and the scan announcement.
    fn run_lidar_localization(&self) -> SimResult<(ScenarioMetrics, Checks)> {
        info!("EPI-001: LidarLocalization");
        let mut checks = Checks::default();
        let mut oracle = Oracle::new(self.physics_seed(), &self.config)?;
        let sensor = sensing_agent();

        let poses = oracle.pose_hypotheses(self.config.hypotheses.max(1))?;
        let belief = pose_belief(oracle.map(), &sensor, &poses)?;

        let geometry = ScanGeometry::full_turn(self.config.beams);
        let scan = oracle.scan(&geometry, self.config.beams, 0.0);
        let sensor_model = LidarSensorModel::default();
        let interpreter = ScanInterpreter::new(sensor.clone(), scan.clone(), sensor_model, geometry);

        let events = build_lidar_event(&scan, &sensor_model)?;
        let (updated, stats) = ProductUpdate::new()
            .with_interpreter(interpreter.clone())
            .apply_with_stats(&belief, &events)?;
        checks.ensure(
            parent_worlds(&updated).contains(&TRUTH),
            "true pose eliminated by product update",
        );

        let consistent = scan_consistency(&scan);
        debug!("  scan consistency: {} atoms", consistent.atoms().len());
        let localized = public_announcement_with(&belief, &consistent, &interpreter);
        let truth_retained = localized.is_designated(TRUTH);
        checks.ensure(truth_retained, "true pose eliminated by scan announcement");
        if poses.len() > 1 {
            checks.ensure(localized.len() < belief.len(), "scan ruled out no false hypothesis");
        }
        checks.ensure(
            Evaluator::with_interpreter(&localized, &interpreter).holds(TRUTH, &Formula::knows(sensor, consistent)),
            "sensor does not know its scan is consistent",
        );

        info!(
            "  hypotheses: {} -> {} | product worlds: {}",
            belief.len(),
            localized.len(),
            stats.worlds_out
        );

        let metrics = ScenarioMetrics {
            worlds_before: stats.worlds_in,
            worlds_after: stats.worlds_out,
            edges_before: stats.edges_in,
            edges_after: stats.edges_out,
            events: events.len(),
            hypotheses_retained: localized.len(),
            hypotheses_dropped: belief.len() - localized.len(),
            truth_retained,
        };
        Ok((metrics, checks))
    }

    /// EPI-002: both robots doubt whether a cell is free until it is
    /// publicly announced.
    fn run_public_announcement(&self) -> SimResult<(ScenarioMetrics, Checks)> {
        info!("EPI-002: PublicAnnouncement");
        let mut checks = Checks::default();
        let (belief, door) = self.door_doubt()?;
        let team = group(["alpha", "beta"]);
        let p = cell_free(door);

        checks.ensure(
            !holds(&belief, TRUTH, &Formula::common_knowledge(team.clone(), p.clone())),
            "fact is common knowledge before the announcement",
        );
        checks.ensure(
            !holds(&belief, TRUTH, &Formula::knows("alpha", p.clone())),
            "alpha knows the fact before the announcement",
        );

        let after = public_announcement(&belief, &p);
        info!("  announced {}: worlds {} -> {}", p, belief.len(), after.len());
        let truth_retained = after.is_designated(TRUTH);
        checks.ensure(truth_retained, "announcement removed the true world");
        checks.ensure(
            holds(&after, TRUTH, &Formula::common_knowledge(team, p.clone())),
            "announcement did not create common knowledge",
        );
        checks.ensure(
            epistemic_core::holds_in_all(&after, &p),
            "a world violating the announcement survived",
        );
        checks.ensure(after.len() == belief.len().div_ceil(2), "unexpected number of surviving worlds");

        Ok((announcement_metrics(&belief, &after, truth_retained), checks))
    }

    /// EPI-003: alpha senses the cell; beta learns nothing.
    fn run_private_observation(&self) -> SimResult<(ScenarioMetrics, Checks)> {
        info!("EPI-003: PrivateObservation");
        let mut checks = Checks::default();
        let (belief, door) = self.door_doubt()?;
        let alpha = AgentId::new("alpha");
        let p = cell_free(door);

        let after = private_observation(&belief, &alpha, &p);
        info!(
            "  alpha observed {}: edges {} -> {}",
            p,
            belief.model().edge_count(),
            after.model().edge_count()
        );

        checks.ensure(after.len() == belief.len(), "private observation changed the worlds");
        checks.ensure(
            holds(&after, TRUTH, &Formula::knows(alpha, p.clone())),
            "observer does not know the fact",
        );
        checks.ensure(
            !holds(&after, TRUTH, &Formula::knows("beta", p.clone())),
            "non-observer learned the fact",
        );
        checks.ensure(
            holds(&after, TRUTH, &Formula::everybody_knows(group(["alpha"]), p.clone())),
            "E over the observer alone does not hold",
        );
        checks.ensure(
            !holds(&after, TRUTH, &Formula::common_knowledge(group(["alpha", "beta"]), p)),
            "private observation created common knowledge",
        );

        Ok((announcement_metrics(&belief, &after, after.is_designated(TRUTH)), checks))
    }

    /// EPI-004: with dropout above one half the sensor cannot separate
    /// bins; the truth survives exactly when some beam returned.
    fn run_sensor_dropout(&self) -> SimResult<(ScenarioMetrics, Checks)> {
        info!("EPI-004: SensorDropout");
        let mut checks = Checks::default();
        let mut oracle = Oracle::new(self.physics_seed(), &self.config)?;
        let sensor = sensing_agent();

        let poses = oracle.pose_hypotheses(self.config.hypotheses.max(1))?;
        let belief = pose_belief(oracle.map(), &sensor, &poses)?;

        let geometry = ScanGeometry::full_turn(self.config.beams);
        let scan = oracle.scan(&geometry, self.config.beams, HEAVY_DROPOUT);
        let sensor_model = LidarSensorModel {
            dropout_prob: HEAVY_DROPOUT,
            ..LidarSensorModel::default()
        };
        let events = build_lidar_event(&scan, &sensor_model)?;
        let n = events.len();
        checks.ensure(events.edge_count() == n * n, "unreliable event model is not fully connected");

        let interpreter = ScanInterpreter::new(sensor, scan.clone(), sensor_model, geometry);
        let (updated, stats) = ProductUpdate::new()
            .with_interpreter(interpreter)
            .apply_with_stats(&belief, &events)?;

        let returns = scan.ranges.iter().filter(|r| !scan.is_invalid(**r)).count();
        let parents = parent_worlds(&updated);
        let truth_retained = parents.contains(&TRUTH);
        info!("  {} of {} beams returned, {} hypotheses remain", returns, n, parents.len());
        if returns > 0 {
            checks.ensure(truth_retained, "true pose eliminated despite a valid return");
        } else {
            checks.ensure(updated.is_empty(), "belief survived a scan with no returns");
        }
        checks.ensure(
            stats.edges_out == stats.worlds_out * stats.worlds_out,
            "sensor separated worlds an unreliable scan cannot separate",
        );

        let metrics = ScenarioMetrics {
            worlds_before: stats.worlds_in,
            worlds_after: stats.worlds_out,
            edges_before: stats.edges_in,
            edges_after: stats.edges_out,
            events: n,
            hypotheses_retained: parents.len(),
            hypotheses_dropped: stats.hypotheses_dropped,
            truth_retained,
        };
        Ok((metrics, checks))
    }

    /// EPI-005: alpha knows its own goal, beta does not, until alpha
    /// announces it. A trivial event afterwards changes nothing.
    fn run_common_ground(&self) -> SimResult<(ScenarioMetrics, Checks)> {
        info!("EPI-005: CommonGround");
        let mut checks = Checks::default();
        let oracle = Oracle::new(self.physics_seed(), &self.config)?;
        let alpha = AgentId::new("alpha");
        let beta = AgentId::new("beta");
        let team = group(["alpha", "beta"]);

        let mut model = KripkeModel::new();
        let goals = ["dock", "charge", "explore"];
        for (i, goal) in goals.iter().enumerate() {
            let world = World::new(WorldId(i as u64), Arc::clone(oracle.map()))
                .with_pose(alpha.clone(), oracle.true_pose())
                .with_goal(alpha.clone(), *goal);
            model.add_world(world)?;
            model.add_indistinguishable(&alpha, &[WorldId(i as u64)])?;
        }
        let ids: Vec<WorldId> = model.world_ids().collect();
        model.add_indistinguishable(&beta, &ids)?;
        let belief = BeliefState::all_designated(model);

        let dock = Formula::atom("goal_is(alpha,dock)");
        checks.ensure(holds(&belief, TRUTH, &Formula::knows("alpha", dock.clone())), "alpha does not know its goal");
        checks.ensure(!holds(&belief, TRUTH, &Formula::knows("beta", dock.clone())), "beta knows alpha's goal");
        checks.ensure(
            holds(&belief, TRUTH, &Formula::common_knowledge(team.clone(), Formula::atom("has_goal(alpha)"))),
            "having a goal is not common ground",
        );

        let after = public_announcement(&belief, &dock);
        let truth_retained = after.is_designated(TRUTH);
        checks.ensure(
            holds(&after, TRUTH, &Formula::common_knowledge(team.clone(), dock.clone())),
            "announced goal is not common ground",
        );

        let trivial = EventModel::trivial(team.iter());
        let settled = product_update(&after, &trivial)?;
        checks.ensure(settled.len() == after.len(), "trivial event changed the world count");
        checks.ensure(
            settled.model().edge_count() == after.model().edge_count(),
            "trivial event changed the relations",
        );

        Ok((announcement_metrics(&belief, &after, truth_retained), checks))
    }

    /// Two robots, `hypotheses` map variants, a door cell free in the
    /// truth and in every even world, occupied in every odd one.
    fn door_doubt(&self) -> SimResult<(BeliefState, (u32, u32))> {
        let mut oracle = Oracle::new(self.physics_seed(), &self.config)?;
        let door = oracle.sample_free_cell()?;
        let count = self.config.hypotheses.max(2);

        let mut maps: Vec<Arc<GridMap>> = Vec::with_capacity(count);
        for i in 0..count {
            let map = if i == 0 {
                Arc::clone(oracle.map())
            } else if i % 2 == 1 {
                oracle.map_with_occupied(&[door])
            } else {
                let clutter = oracle.sample_free_cell()?;
                if clutter == door {
                    Arc::clone(oracle.map())
                } else {
                    oracle.map_with_occupied(&[clutter])
                }
            };
            maps.push(map);
        }

        let agents = [AgentId::new("alpha"), AgentId::new("beta")];
        let mut model = KripkeModel::new();
        for (i, map) in maps.into_iter().enumerate() {
            model.add_world(World::new(WorldId(i as u64), map))?;
        }
        let ids: Vec<WorldId> = model.world_ids().collect();
        for agent in &agents {
            model.add_indistinguishable(agent, &ids)?;
        }
        Ok((BeliefState::all_designated(model), door))
    }
}

/// One world per pose hypothesis; `agent` cannot tell them apart.
fn pose_belief(map: &Arc<GridMap>, agent: &AgentId, poses: &[Pose]) -> SimResult<BeliefState> {
    let mut model = KripkeModel::new();
    for (i, pose) in poses.iter().enumerate() {
        model.add_world(World::new(WorldId(i as u64), Arc::clone(map)).with_pose(agent.clone(), *pose))?;
    }
    let ids: Vec<WorldId> = model.world_ids().collect();
    model.add_indistinguishable(agent, &ids)?;
    Ok(BeliefState::all_designated(model))
}

/// Conjunction of the bins that returned; ⊤ when none did.
fn scan_consistency(scan: &LidarObservation) -> Formula {
    scan.ranges
        .iter()
        .enumerate()
        .filter(|(_, r)| !scan.is_invalid(**r))
        .map(|(i, _)| Formula::atom(bin_atom(i)))
        .reduce(Formula::and)
        .unwrap_or_else(Formula::top)
}

fn cell_free((x, y): (u32, u32)) -> Formula {
    Formula::atom(format!("cell_free({},{})", x, y))
}

/// Hypotheses an updated belief descends from.
fn parent_worlds(belief: &BeliefState) -> BTreeSet<WorldId> {
    belief.designated().iter().map(|id| unpair_id(*id).0).collect()
}

fn announcement_metrics(before: &BeliefState, after: &BeliefState, truth_retained: bool) -> ScenarioMetrics {
    ScenarioMetrics {
        worlds_before: before.len(),
        worlds_after: after.len(),
        edges_before: before.model().edge_count(),
        edges_after: after.model().edge_count(),
        events: 0,
        hypotheses_retained: after.len(),
        hypotheses_dropped: before.len() - after.len(),
        truth_retained,
    }
}
